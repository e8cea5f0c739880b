use crate::model::{date, TransactionFields};
use crate::utils;
use crate::Result;
use tracing::debug;

/// Turns recorded speech into transaction fields.
#[async_trait::async_trait]
pub trait SpeechToText: Send + Sync {
    async fn recognize(&self, audio: &[u8]) -> Result<TransactionFields>;
}

/// Ignores the audio and makes up a plausible fill-up for today: 30 to 50 liters at 23,000 to
/// 25,000 per liter.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockSpeechToText;

pub(crate) const VOICE_LOCATION: &str = "Fuel station";
pub(crate) const VOICE_NOTE: &str = "Voice entry";

impl MockSpeechToText {
    fn fields_from(liters_roll: f64, price_roll: f64) -> TransactionFields {
        let amount = (30.0 + liters_roll * 20.0).floor();
        let price = (23000.0 + price_roll * 2000.0).floor();
        TransactionFields::new(date::today(), amount, price)
            .with_total_cost(amount * price)
            .with_location(VOICE_LOCATION)
            .with_notes(VOICE_NOTE)
    }
}

#[async_trait::async_trait]
impl SpeechToText for MockSpeechToText {
    async fn recognize(&self, audio: &[u8]) -> Result<TransactionFields> {
        debug!("Recognizing {} bytes of audio", audio.len());
        Ok(Self::fields_from(utils::unit_random(), utils::unit_random()))
    }
}
