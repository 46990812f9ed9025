//! Helper macro generating port error enums with snake_case constructors.
//!
//! ```ignore
//! define_port_error! {
//!     /// Errors surfaced by the example adapter.
//!     pub enum ExampleError {
//!         Connection { message: String } => "connection failed: {message}",
//!     }
//! }
//! let err = ExampleError::connection("refused");
//! ```

macro_rules! define_port_error {
    (@ctor $name:ident $variant:ident) => {
        ::paste::paste! {
            #[doc = concat!("Construct [`", stringify!($name), "::", stringify!($variant), "`].")]
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $name:ident $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        define_port_error!(@ctor_impl $name $variant () () $( $field : $ty, )*);
    };

    (@ctor_impl $name:ident $variant:ident ($($params:tt)*) ($($inits:tt)*) ) => {
        ::paste::paste! {
            #[doc = concat!("Construct [`", stringify!($name), "::", stringify!($variant), "`].")]
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };

    (@ctor_impl $name:ident $variant:ident ($($params:tt)*) ($($inits:tt)*) $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @ctor_impl
            $name
            $variant
            ($($params)* $field: impl Into<$ty>,)
            ($($inits)* $field: $field.into(),)
            $($rest)*
        );
    };

    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $(#[allow(missing_docs)] $field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $name $variant $( { $($field : $ty),* } )?);
            )*
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    define_port_error! {
        pub enum SpoolError {
            Full => "spool is full",
            Rejected { message: String } => "rejected: {message}",
            Backlog { message: String, pending: u32 } => "{message} ({pending} pending)",
        }
    }

    #[test]
    fn unit_variants_get_constructors() {
        assert_eq!(SpoolError::full().to_string(), "spool is full");
    }

    #[test]
    fn string_fields_accept_str() {
        assert_eq!(SpoolError::rejected("bad payload").to_string(), "rejected: bad payload");
    }

    #[test]
    fn mixed_fields_keep_their_types() {
        let err = SpoolError::backlog("slow worker", 12_u32);
        assert_eq!(err, SpoolError::Backlog { message: "slow worker".to_owned(), pending: 12 });
        assert_eq!(err.to_string(), "slow worker (12 pending)");
    }
}
