//! The [`Describe`] capability: turning values into text.
//!
//! Anything that should appear in a diagnostic line implements [`Describe`].
//! A description is either text, raw bytes in the active charset, or another
//! value to describe in its place. Describing can fail, in which case the
//! sanitizer reports the value by its type name instead.
//!
//! Implementations are provided for strings, byte strings, numbers, `bool`,
//! `char`, `Option` and the common smart pointers. Two wrappers cover
//! everything else:
//!
//! - [`Displayed`] describes any [`Display`](fmt::Display) type, absorbing
//!   formatting errors and panics.
//! - [`Opaque`] is the fallback for values with no textual form at all.
//!
//! ```rust
//! use exc_string::{ExcFormatter, charset::Charset, describe::Opaque};
//!
//! struct Handle(u32);
//!
//! let formatter = ExcFormatter::new(Charset::ASCII);
//! assert_eq!(formatter.force_string(&None::<i32>), "None");
//! assert_eq!(
//!     formatter.force_string(&Opaque(Handle(7))),
//!     "unable to convert Handle to string, str() failed"
//! );
//! ```

use std::{borrow::Cow, fmt, fmt::Write as _, rc::Rc, sync::Arc};

use crate::panic::catch_silently;

/// Why a value could not be described.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    /// The value's formatting implementation returned an error.
    #[error("formatting the value returned an error")]
    Format,
    /// The value's formatting implementation panicked.
    #[error("formatting the value panicked")]
    Panicked,
    /// The value has no textual representation.
    #[error("the value has no textual representation")]
    Unsupported,
    /// The description refers back to a value that is already being
    /// described.
    #[error("the value describes itself")]
    SelfReferential,
    /// Descriptions nested deeper than the given limit.
    #[error("the description nests deeper than {0} levels")]
    TooDeep(usize),
}

/// The result of describing a value.
pub enum Description<'a> {
    /// Text, to be confined to the active charset.
    Text(Cow<'a, str>),
    /// Bytes, to be decoded in the active charset.
    Bytes(Cow<'a, [u8]>),
    /// Another value to describe in place of this one.
    Value(&'a dyn Describe),
}

impl fmt::Debug for Description<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(bytes).finish(),
            Self::Value(value) => f.debug_tuple("Value").field(&value.type_name()).finish(),
        }
    }
}

/// A value that can describe itself as text.
///
/// # Examples
///
/// ```rust
/// use std::borrow::Cow;
///
/// use exc_string::{
///     ExcFormatter,
///     charset::Charset,
///     describe::{ConversionError, Describe, Description},
/// };
///
/// struct Port(u16);
///
/// impl Describe for Port {
///     fn describe(&self) -> Result<Description<'_>, ConversionError> {
///         Ok(Description::Text(Cow::Owned(format!("port {}", self.0))))
///     }
/// }
///
/// let formatter = ExcFormatter::new(Charset::ASCII);
/// assert_eq!(formatter.force_string(&Port(8080)), "port 8080");
/// ```
pub trait Describe {
    /// Describes this value.
    fn describe(&self) -> Result<Description<'_>, ConversionError>;

    /// The name of this value's type.
    ///
    /// Defaults to [`core::any::type_name`]. Diagnostics show only its last
    /// path segment, without generic arguments. Unlike [`Describe::describe`],
    /// a panic here is not absorbed by [`force_string`](crate::force_string).
    fn type_name(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

impl Describe for str {
    fn describe(&self) -> Result<Description<'_>, ConversionError> {
        Ok(Description::Text(Cow::Borrowed(self)))
    }
}

impl Describe for String {
    fn describe(&self) -> Result<Description<'_>, ConversionError> {
        Ok(Description::Text(Cow::Borrowed(self)))
    }
}

impl Describe for Cow<'_, str> {
    fn describe(&self) -> Result<Description<'_>, ConversionError> {
        Ok(Description::Text(Cow::Borrowed(self)))
    }
}

impl Describe for [u8] {
    fn describe(&self) -> Result<Description<'_>, ConversionError> {
        Ok(Description::Bytes(Cow::Borrowed(self)))
    }
}

impl<const N: usize> Describe for [u8; N] {
    fn describe(&self) -> Result<Description<'_>, ConversionError> {
        Ok(Description::Bytes(Cow::Borrowed(self)))
    }
}

impl Describe for Vec<u8> {
    fn describe(&self) -> Result<Description<'_>, ConversionError> {
        Ok(Description::Bytes(Cow::Borrowed(self)))
    }
}

macro_rules! describe_with_to_string {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Describe for $ty {
                fn describe(&self) -> Result<Description<'_>, ConversionError> {
                    Ok(Description::Text(Cow::Owned(self.to_string())))
                }
            }
        )*
    };
}

describe_with_to_string!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool, char,
);

impl Describe for () {
    fn describe(&self) -> Result<Description<'_>, ConversionError> {
        Ok(Description::Text(Cow::Borrowed("None")))
    }
}

impl<T: Describe> Describe for Option<T> {
    fn describe(&self) -> Result<Description<'_>, ConversionError> {
        match self {
            Some(value) => Ok(Description::Value(value)),
            None => Ok(Description::Text(Cow::Borrowed("None"))),
        }
    }
}

macro_rules! describe_through_pointer {
    ($($ptr:ident),*) => {
        $(
            impl<T: Describe + ?Sized> Describe for $ptr<T> {
                fn describe(&self) -> Result<Description<'_>, ConversionError> {
                    (**self).describe()
                }

                fn type_name(&self) -> &'static str {
                    (**self).type_name()
                }
            }
        )*
    };
}

describe_through_pointer!(Box, Rc, Arc);

impl<T: Describe + ?Sized> Describe for &T {
    fn describe(&self) -> Result<Description<'_>, ConversionError> {
        (**self).describe()
    }

    fn type_name(&self) -> &'static str {
        (**self).type_name()
    }
}

/// Describes a value through its [`Display`](fmt::Display) implementation.
///
/// A `Display` implementation that returns an error or panics is reported as
/// a conversion failure.
///
/// ```rust
/// use exc_string::{ExcFormatter, charset::Charset, describe::Displayed};
///
/// let formatter = ExcFormatter::new(Charset::ASCII);
/// let error = std::io::Error::other("disk full");
/// assert_eq!(formatter.force_string(&Displayed(error)), "disk full");
/// ```
#[derive(Copy, Clone, Debug)]
pub struct Displayed<T>(pub T);

impl<T: fmt::Display> Describe for Displayed<T> {
    fn describe(&self) -> Result<Description<'_>, ConversionError> {
        let formatted = catch_silently(|| {
            let mut text = String::new();
            write!(text, "{}", self.0).map(|()| text)
        });
        match formatted {
            Ok(Ok(text)) => Ok(Description::Text(Cow::Owned(text))),
            Ok(Err(fmt::Error)) => Err(ConversionError::Format),
            Err(_payload) => Err(ConversionError::Panicked),
        }
    }

    fn type_name(&self) -> &'static str {
        core::any::type_name::<T>()
    }
}

/// Fallback for values without a textual representation.
///
/// Always fails to describe, so the value is reported by its type name.
#[derive(Copy, Clone, Debug)]
pub struct Opaque<T>(pub T);

impl<T> Describe for Opaque<T> {
    fn describe(&self) -> Result<Description<'_>, ConversionError> {
        Err(ConversionError::Unsupported)
    }

    fn type_name(&self) -> &'static str {
        core::any::type_name::<T>()
    }
}
