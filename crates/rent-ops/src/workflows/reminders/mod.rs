pub mod dispatcher;
pub mod gateway;
pub mod store;
pub mod template;

pub use dispatcher::{
    BulkDispatchOutcome, DispatchError, DispatchFailure, DispatchLimits, DispatchResult,
    ReminderDispatcher,
};
pub use gateway::{DeliveryError, DeliveryReceipt, MessageGateway};
pub use store::{PaymentFilter, PaymentStore, StoreError, TenantContact};
pub use template::{TemplateCatalog, TemplateError, TemplateVars};
