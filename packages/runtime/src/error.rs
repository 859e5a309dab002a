use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    #[error("Node is not attached to a parent")]
    Detached,

    #[error("{0} nodes cannot have children")]
    NotAContainer(&'static str),
}

/// Failure while attaching or detaching a hook. Propagated to whoever drives
/// the render pass; nothing here retries or swallows it.
#[derive(Error, Debug)]
pub enum HookError {
    #[error(transparent)]
    Dom(#[from] DomError),

    #[error("Subscriber for '{property}' failed: {message}")]
    Subscriber { property: String, message: String },
}

impl HookError {
    pub fn subscriber(property: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Subscriber {
            property: property.into(),
            message: message.into(),
        }
    }
}
