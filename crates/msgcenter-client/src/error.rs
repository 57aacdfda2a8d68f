use msgcenter_shared::MessageId;
use msgcenter_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Message not in list: {0}")]
    UnknownMessage(MessageId),
}
