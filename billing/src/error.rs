use solana_program::pubkey::Pubkey;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BillingError {
    #[error("no valid program address for {0} seeds")]
    MissingDerivedKey(&'static str),
    #[error("metadata of safety deposit {safety_deposit} is not loaded yet")]
    IncompleteMetadata { safety_deposit: Pubkey },
    #[error("external call failed: {0}")]
    ExternalCallFailure(String),
    #[error("{kind} account {pubkey} not found")]
    MissingAccount { kind: &'static str, pubkey: Pubkey },
    #[error("{kind} account {pubkey} holds invalid data")]
    InvalidAccountData { kind: &'static str, pubkey: Pubkey },
    #[error("arithmetic overflow while summing {0}")]
    ArithmeticOverflow(&'static str),
}

impl BillingError {
    /// Returns `true` if the error only signals that the snapshot is not
    /// ready, so the caller may retry with a fresher one.
    pub fn is_not_ready(&self) -> bool {
        matches!(self, BillingError::IncompleteMetadata { .. })
    }
}

#[cfg(feature = "rpc")]
impl From<solana_client::client_error::ClientError> for BillingError {
    fn from(e: solana_client::client_error::ClientError) -> Self {
        BillingError::ExternalCallFailure(e.to_string())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn only_incomplete_metadata_is_not_ready() {
        let safety_deposit = Pubkey::new_unique();
        assert!(BillingError::IncompleteMetadata { safety_deposit }.is_not_ready());
        assert!(!BillingError::ExternalCallFailure("timeout".to_owned()).is_not_ready());
        assert!(!BillingError::MissingAccount {
            kind: "auction",
            pubkey: safety_deposit,
        }
        .is_not_ready());
    }

    #[cfg(feature = "rpc")]
    #[test]
    fn client_errors_are_external_call_failures() {
        let io_error = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let client_error = solana_client::client_error::ClientError::from(io_error);
        let message = client_error.to_string();
        match BillingError::from(client_error) {
            BillingError::ExternalCallFailure(e) => assert_eq!(e, message),
            other => panic!("unexpected error {:?}", other),
        }
    }
}
