use bytes::{BufMut, BytesMut};

use super::asset_mismatch;
use crate::config::{ADDRESS_LENGTH, MIN_MULTI_PAYMENTS};
use crate::transaction::codec::CodecError;
use crate::transaction::registry::{AssetCodec, CodecLimits};
use crate::transaction::types::{Asset, InternalType, Payment, TransactionType};
use crate::transaction::wire::{put_address, WireReader};

const PAYMENT_LENGTH: usize = 8 + ADDRESS_LENGTH;

/// One sender, many recipients.
pub struct MultiPaymentCodec;

impl AssetCodec for MultiPaymentCodec {
    fn internal_type(&self) -> InternalType {
        TransactionType::MultiPayment.internal_type()
    }

    fn name(&self) -> &str {
        TransactionType::MultiPayment.name()
    }

    fn min_asset_length(&self) -> usize {
        2 + MIN_MULTI_PAYMENTS * PAYMENT_LENGTH
    }

    fn supports_vendor_field(&self) -> bool {
        true
    }

    fn static_fee(&self, _asset: Option<&Asset>) -> u64 {
        10_000_000
    }

    fn addon_bytes(&self) -> u64 {
        500
    }

    fn validate(&self, asset: Option<&Asset>, limits: &CodecLimits) -> Result<(), CodecError> {
        let Some(Asset::MultiPayment(payments)) = asset else {
            return Err(asset_mismatch(self.name(), asset));
        };
        let max = limits.multi_payment_limit.min(u16::MAX as usize);
        if payments.len() < MIN_MULTI_PAYMENTS || payments.len() > max {
            return Err(CodecError::invalid(format!(
                "multipayment needs {} to {} payments, got {}",
                MIN_MULTI_PAYMENTS,
                max,
                payments.len()
            )));
        }
        if let Some(i) = payments.iter().position(|p| p.amount == 0) {
            return Err(CodecError::invalid(format!("payment {} has a zero amount", i)));
        }
        payments
            .iter()
            .try_fold(0u64, |total, p| total.checked_add(p.amount))
            .ok_or_else(|| CodecError::invalid("multipayment total overflows u64"))?;
        Ok(())
    }

    fn encode_asset(&self, asset: Option<&Asset>, buf: &mut BytesMut) -> Result<(), CodecError> {
        let Some(Asset::MultiPayment(payments)) = asset else {
            return Err(asset_mismatch(self.name(), asset));
        };
        buf.put_u16_le(payments.len() as u16);
        for payment in payments {
            buf.put_u64_le(payment.amount);
            put_address(buf, &payment.recipient);
        }
        Ok(())
    }

    fn decode_asset(&self, reader: &mut WireReader<'_>) -> Result<Option<Asset>, CodecError> {
        let count = reader.read_u16("payment count")? as usize;
        if count < MIN_MULTI_PAYMENTS {
            return Err(CodecError::malformed(format!(
                "multipayment with {} payments",
                count
            )));
        }
        // The upper limit is network-dependent and checked by validate();
        // here we only make sure the bytes are actually there.
        reader.ensure(count * PAYMENT_LENGTH, "payments")?;

        let mut payments = Vec::with_capacity(count);
        for _ in 0..count {
            let amount = reader.read_u64("payment amount")?;
            let recipient = reader.read_address("payment recipient")?;
            payments.push(Payment { amount, recipient });
        }
        Ok(Some(Asset::MultiPayment(payments)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Address;
    use crate::transaction::assets::test_support::{decode_bytes, is_invalid, roundtrip};

    fn payments(n: usize) -> Vec<Payment> {
        (0..n)
            .map(|i| Payment {
                amount: 100 + i as u64,
                recipient: Address::new(0x1E, [i as u8; 20]),
            })
            .collect()
    }

    #[test]
    fn roundtrip_payments() {
        let asset = Asset::MultiPayment(payments(5));
        assert_eq!(roundtrip(&MultiPaymentCodec, Some(asset.clone())), Some(asset));
    }

    #[test]
    fn count_bounds() {
        let limits = CodecLimits::default();
        assert!(is_invalid(
            MultiPaymentCodec.validate(Some(&Asset::MultiPayment(payments(1))), &limits)
        ));
        assert!(is_invalid(MultiPaymentCodec.validate(
            Some(&Asset::MultiPayment(payments(limits.multi_payment_limit + 1))),
            &limits
        )));

        let raised = CodecLimits {
            multi_payment_limit: 128,
            ..limits
        };
        assert!(MultiPaymentCodec
            .validate(Some(&Asset::MultiPayment(payments(100))), &raised)
            .is_ok());
    }

    #[test]
    fn zero_amount_rejected() {
        let mut p = payments(2);
        p[1].amount = 0;
        assert!(is_invalid(
            MultiPaymentCodec.validate(Some(&Asset::MultiPayment(p)), &CodecLimits::default())
        ));
    }

    #[test]
    fn overflowing_total_rejected() {
        let mut p = payments(2);
        p[0].amount = u64::MAX;
        assert!(is_invalid(
            MultiPaymentCodec.validate(Some(&Asset::MultiPayment(p)), &CodecLimits::default())
        ));
    }

    #[test]
    fn count_larger_than_data_is_malformed() {
        let mut bytes = 3u16.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[0u8; PAYMENT_LENGTH * 2]);
        assert!(matches!(
            decode_bytes(&MultiPaymentCodec, &bytes),
            Err(CodecError::MalformedPayload { .. })
        ));
    }
}
