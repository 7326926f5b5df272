use bigdecimal::BigDecimal;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::ports::DeliveryFeeProvider;

/// Charges the same delivery fee for every restaurant and address.
pub struct FlatDeliveryFee {
    fee: BigDecimal,
}

impl FlatDeliveryFee {
    pub fn new(fee: BigDecimal) -> Self {
        Self { fee }
    }
}

impl DeliveryFeeProvider for FlatDeliveryFee {
    fn delivery_charge(
        &self,
        _restaurant_id: Uuid,
        _address: Option<&str>,
    ) -> Result<BigDecimal, DomainError> {
        Ok(self.fee.clone())
    }
}
