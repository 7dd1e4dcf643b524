//! # CosmWasm logging
//!
//! `log` macros for contracts, printed through `Api::debug`.
//!
//! With the `logging` feature the macros are the ones from the `log` crate and records are
//! forwarded to the `Api` handed to [`init_cosmwasm_logger`]. Without it every macro expands to
//! an unused `format_args!`, which type checks the arguments and compiles to nothing.
//!
//! ```rust,ignore
//! use cosmwasm_logging::{info, init_cosmwasm_logger};
//!
//! pub fn execute(deps: DepsMut, env: Env, info: MessageInfo, msg: ExecuteMsg) -> Result<Response, ContractError> {
//!     init_cosmwasm_logger(deps.api);
//!     info!("execute from {} at height {}", info.sender, env.block.height);
//!     // ...
//! }
//! ```
//!
//! Records are printed as `target: [LEVEL] message`.

#[cfg(feature = "logging")]
mod enabled {
    use std::cell::Cell;
    use std::sync::Once;

    use cosmwasm_std::Api;
    use log::{LevelFilter, Log, Metadata, Record};

    static LOGGER: ApiLogger = ApiLogger;
    static INSTALL: Once = Once::new();

    thread_local! {
        static CURRENT_API: Cell<Option<&'static dyn Api>> = const { Cell::new(None) };
    }

    struct ApiLogger;

    impl Log for ApiLogger {
        fn enabled(&self, _metadata: &Metadata) -> bool {
            true
        }

        fn log(&self, record: &Record) {
            CURRENT_API.with(|current| {
                if let Some(api) = current.get() {
                    api.debug(&format!(
                        "{}: [{}] {}",
                        record.target(),
                        record.level(),
                        record.args()
                    ));
                }
            });
        }

        fn flush(&self) {}
    }

    /// Points the logger at `api`.
    ///
    /// Call it at the start of every entry point: the `Api` of the running call replaces the
    /// previous one. The global `log` logger is installed on the first call only.
    pub fn init_cosmwasm_logger(api: &dyn Api) {
        // SAFETY: the reference is replaced at the start of every entry point and the runtime
        // keeps `api` alive for the whole call, so no record is printed through a stale `Api`.
        let api: &'static dyn Api = unsafe { std::mem::transmute::<&dyn Api, &'static dyn Api>(api) };
        CURRENT_API.with(|current| current.set(Some(api)));

        INSTALL.call_once(|| {
            if log::set_logger(&LOGGER).is_ok() {
                log::set_max_level(LevelFilter::Trace);
            }
        });
    }
}

#[cfg(feature = "logging")]
pub use enabled::init_cosmwasm_logger;
#[cfg(feature = "logging")]
pub use log::{debug, error, info, log, trace, warn};

#[cfg(not(feature = "logging"))]
mod disabled {
    /// No-op: the `logging` feature is off.
    pub fn init_cosmwasm_logger(_api: &dyn cosmwasm_std::Api) {}

    #[macro_export]
    macro_rules! error {
        (target: $target:expr, $($arg:tt)+) => {{ let _ = $target; let _ = format_args!($($arg)+); }};
        ($($arg:tt)+) => {{ let _ = format_args!($($arg)+); }};
    }

    #[macro_export]
    macro_rules! warn {
        (target: $target:expr, $($arg:tt)+) => {{ let _ = $target; let _ = format_args!($($arg)+); }};
        ($($arg:tt)+) => {{ let _ = format_args!($($arg)+); }};
    }

    #[macro_export]
    macro_rules! info {
        (target: $target:expr, $($arg:tt)+) => {{ let _ = $target; let _ = format_args!($($arg)+); }};
        ($($arg:tt)+) => {{ let _ = format_args!($($arg)+); }};
    }

    #[macro_export]
    macro_rules! debug {
        (target: $target:expr, $($arg:tt)+) => {{ let _ = $target; let _ = format_args!($($arg)+); }};
        ($($arg:tt)+) => {{ let _ = format_args!($($arg)+); }};
    }

    #[macro_export]
    macro_rules! trace {
        (target: $target:expr, $($arg:tt)+) => {{ let _ = $target; let _ = format_args!($($arg)+); }};
        ($($arg:tt)+) => {{ let _ = format_args!($($arg)+); }};
    }
}

#[cfg(not(feature = "logging"))]
pub use disabled::init_cosmwasm_logger;
