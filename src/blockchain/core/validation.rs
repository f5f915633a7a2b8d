use crate::blockchain::core::chain::Block;
use crate::blockchain::core::registry::ParticipantRegistry;
use crate::error::ValidationError;
use crate::transaction::Transaction;

/// Re-derive every block after genesis and stop at the first failure.
///
/// For each block the stored hash must equal a fresh hash of its contents,
/// `previous_hash` must equal the preceding block's stored hash, and every
/// included transaction must come from a registered sender and carry a
/// signature that verifies under that sender's key. Genesis is trusted.
pub fn validate_chain(
    blocks: &[Block],
    participants: &ParticipantRegistry,
) -> Result<(), ValidationError> {
    for pair in blocks.windows(2) {
        let (previous, current) = (&pair[0], &pair[1]);
        let index = current.index();

        match current.calculate_hash() {
            Ok(hash) if hash == current.hash() => {}
            _ => return Err(ValidationError::HashMismatch { index }),
        }

        if current.previous_hash() != previous.hash() {
            return Err(ValidationError::BrokenLink { index });
        }

        for record in current.transactions() {
            let public_key = participants.get(&record.sender).ok_or_else(|| {
                ValidationError::UnknownSender {
                    index,
                    sender: record.sender.clone(),
                }
            })?;

            if !Transaction::from(record).verify(public_key) {
                return Err(ValidationError::InvalidSignature {
                    index,
                    sender: record.sender.clone(),
                });
            }
        }
    }
    Ok(())
}
