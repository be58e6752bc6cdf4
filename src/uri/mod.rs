//! Resource-path and query-option resolution
//!
//! Turns percent-decoded path segments plus query options into an immutable
//! [`UriInfo`] aggregate, or a typed error the HTTP layer maps to 400
//! ([`UriSyntaxError`]) or 404 ([`UriNotMatchingError`]).

mod error;
mod info;
mod resolver;

pub use error::{UriError, UriNotMatchingError, UriResult, UriSyntaxError};
pub use info::{
    Format, InlineCount, KeyPredicate, NavigationSegment, SelectItem, UriInfo, UriKind,
};
pub use resolver::UriParser;
