pub mod classifier;
pub mod domain;
pub mod import;
pub mod summary;
pub mod tax;

pub use classifier::classify;
pub use domain::{DateRange, MalformedRecord, PaymentMethod, PaymentRecord, PaymentStatus};
pub use import::{PaymentCsvImporter, PaymentImportError};
pub use summary::{summarize, AccountingSummary};
pub use tax::{estimate, DeductionBreakdown, TaxInputError, TaxSummary};
