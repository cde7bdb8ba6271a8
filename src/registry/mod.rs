//! Destination registry and naming
//!
//! Maps logical names to queues and topics. A name resolves to exactly one
//! destination for the life of the provider; lookups go through configured
//! aliases first, the way directory names map onto physical destinations.

mod destination;
mod table;

pub use destination::{Destination, DestinationKind, DestinationRef};
pub use table::{DestinationRegistry, NamingContext};
