use stakegraph_store::EntityKind;

/// Why an event could not be applied. None of these are recoverable: the
/// event's writes are discarded and processing stops.
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    /// A record the event requires was never created. This means events
    /// were delivered out of order or some are missing.
    #[error("{kind} {id} does not exist")]
    MissingEntity { kind: EntityKind, id: String },
    #[error("staking contract read failed: {0:#}")]
    Contract(anyhow::Error),
    #[error("store error: {0:#}")]
    Store(anyhow::Error),
}

impl ProcessingError {
    pub fn missing(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::MissingEntity {
            kind,
            id: id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        let err = ProcessingError::missing(EntityKind::Allocation, "0xc1");
        assert_eq!(err.to_string(), "Allocation 0xc1 does not exist");

        let err = ProcessingError::Contract(anyhow::anyhow!("timeout").context("stakes(address)"));
        assert_eq!(
            err.to_string(),
            "staking contract read failed: stakes(address): timeout"
        );
    }
}
