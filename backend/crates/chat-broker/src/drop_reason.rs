/// Why a delivery attempt did not reach a recipient
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Recipient channel had no spare capacity
    Full,
    /// Recipient dropped its receiver without unregistering
    Closed,
    /// Unicast to an identifier with no registered channel
    NoRecipient,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Closed => "closed",
            Self::NoRecipient => "no_recipient",
        }
    }
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
