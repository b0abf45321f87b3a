//! Unified logging macro for the crate.
//!
//! `knx_log!` routes to the `log` facade when the `log` feature is enabled,
//! to `defmt` when only the `defmt` feature is enabled, and compiles to
//! nothing otherwise. Format strings stick to `{}` and `{:?}` so both
//! backends accept them.
//!
//! ```rust
//! use knx_secure::knx_log;
//!
//! let blocks = 3;
//! knx_log!(debug, "additional info rejected, {} blocks present", blocks);
//! knx_log!(warn, "MAC verification failed");
//! ```

/// Crate-wide logging macro, see the module docs for backend selection.
#[macro_export]
#[cfg(feature = "log")]
macro_rules! knx_log {
    (info, $($arg:tt)*) => { $crate::log::info!($($arg)*) };
    (debug, $($arg:tt)*) => { $crate::log::debug!($($arg)*) };
    (warn, $($arg:tt)*) => { $crate::log::warn!($($arg)*) };
    (error, $($arg:tt)*) => { $crate::log::error!($($arg)*) };
    (trace, $($arg:tt)*) => { $crate::log::trace!($($arg)*) };
}

#[macro_export]
#[cfg(all(feature = "defmt", not(feature = "log")))]
macro_rules! knx_log {
    (info, $($arg:tt)*) => { defmt::info!($($arg)*) };
    (debug, $($arg:tt)*) => { defmt::debug!($($arg)*) };
    (warn, $($arg:tt)*) => { defmt::warn!($($arg)*) };
    (error, $($arg:tt)*) => { defmt::error!($($arg)*) };
    (trace, $($arg:tt)*) => { defmt::trace!($($arg)*) };
}

// Arguments are still type-checked but never evaluated.
#[macro_export]
#[cfg(not(any(feature = "log", feature = "defmt")))]
macro_rules! knx_log {
    ($level:ident, $($arg:tt)*) => {
        if false {
            ::core::mem::drop(::core::format_args!($($arg)*));
        }
    };
}
