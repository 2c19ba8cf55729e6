use std::fmt;
use std::num::NonZeroU16;

/// HTTP Status Code.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(NonZeroU16);

impl Default for StatusCode {
    #[inline]
    fn default() -> Self {
        Self::OK
    }
}

macro_rules! status_codes {
    (
        $(
            $(#[$doc:meta])*
            $int:literal $id:ident $msg:literal;
        )*
    ) => {
        impl StatusCode {
            /// Returns the status code value, e.g: `204`.
            #[inline]
            pub const fn status(&self) -> u16 {
                self.0.get()
            }

            /// Returns the status code and message as a string slice, e.g:
            /// `"204 No Content"`.
            #[inline]
            pub const fn as_str(&self) -> &'static str {
                match self.0.get() {
                    $(
                        $int => concat!(stringify!($int), " ", $msg),
                    )*
                    _ => unreachable!(),
                }
            }

            /// Returns the status message, e.g: `"No Content"`.
            #[inline]
            pub const fn message(&self) -> &'static str {
                match self.0.get() {
                    $(
                        $int => $msg,
                    )*
                    _ => unreachable!(),
                }
            }
        }

        impl StatusCode {
            $(
                $(#[$doc])*
                pub const $id: Self = Self(NonZeroU16::new($int).unwrap());
            )*
        }
    };
}

status_codes! {
    /// `200`. The request succeeded.
    200 OK "OK";
    /// `204`. There is no content to send for this request.
    204 NO_CONTENT "No Content";
    /// `400`. The server cannot or will not process the request due to
    /// something that is perceived to be a client error.
    400 BAD_REQUEST "Bad Request";
    /// `404`. The server cannot find the requested resource.
    404 NOT_FOUND "Not Found";
    /// `408`. The server timed out waiting for the rest of the request.
    408 REQUEST_TIMEOUT "Request Timeout";
    /// `414`. The request target is longer than the server is willing to
    /// interpret.
    414 URI_TOO_LONG "URI Too Long";
    /// `500`. The server encountered an internal error.
    500 INTERNAL_SERVER_ERROR "Internal Server Error";
    /// `505`. The HTTP version used in the request is not supported.
    505 VERSION_NOT_SUPPORTED "HTTP Version Not Supported";
}

impl fmt::Debug for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
