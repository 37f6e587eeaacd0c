pub mod config;
pub mod draft;
pub mod error;
pub mod invoice;
pub mod logo;
pub mod render;
pub mod session;
pub mod totals;

pub use error::{InvoiceError, RenderError, ValidationError};
pub use invoice::{Field, InvoiceState, LineItem, PaymentMethod};
pub use render::{Layout, RenderedDocument, Snapshot};
pub use session::{Readout, Session, SessionEvent};
