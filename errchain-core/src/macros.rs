//! Formatting shorthands for building chain nodes.

/// Creates a base [`ChainError`](crate::ChainError) from a format string.
///
/// The stacktrace starts at the macro call site.
#[macro_export]
macro_rules! errorf {
    ($($arg:tt)+) => {
        $crate::ChainError::new(::std::format!($($arg)+))
    };
}

/// Wraps an `Option` error with a formatted message; `None` stays `None`.
#[macro_export]
macro_rules! wrapf {
    ($err:expr, $($arg:tt)+) => {
        $crate::wrap($err, ::std::format!($($arg)+))
    };
}

/// Returns early with a base error built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)+) => {
        return ::std::result::Result::Err($crate::errorf!($($arg)+).into())
    };
}

/// Returns early with a base error unless `cond` holds.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            $crate::bail!($($arg)+);
        }
    };
}
