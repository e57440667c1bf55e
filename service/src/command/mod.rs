//! [`Command`] definition.

pub mod cancel_contract;
pub mod correct_payment;
pub mod create_contract;
pub mod delete_property;
pub mod delete_user;
pub mod end_contract;
pub mod record_payment;

use common::define_kind;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    cancel_contract::CancelContract, correct_payment::CorrectPayment,
    create_contract::CreateContract, delete_property::DeleteProperty,
    delete_user::DeleteUser, end_contract::EndContract,
    record_payment::RecordPayment,
};

define_kind! {
    #[doc = "Broad classification of a [`Command`] execution error, \
             allowing callers to map it onto their own error surface."]
    enum ErrorKind {
        #[doc = "Referenced entity does not exist."]
        NotFound = 1,

        #[doc = "Execution conflicts with the current state."]
        Conflict = 2,

        #[doc = "Issuer is not allowed to execute the [`Command`]."]
        Unauthorized = 3,

        #[doc = "Infrastructure failure."]
        Internal = 4,
    }
}
