use serde::{Deserialize, Serialize};

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            Default,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            Serialize,
            Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Creates an identifier from its raw value.
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            /// Returns the raw value.
            pub const fn as_u64(&self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

numeric_id!(
    /// Identifier assigned by the order service.
    ///
    /// `0` is reserved for "no order was created" and is what callers see
    /// when a saga fails before the order service accepted the order.
    OrderId
);

impl OrderId {
    /// Sentinel for a saga that never created an order.
    pub const NONE: OrderId = OrderId(0);

    /// Returns true if this is the `NONE` sentinel.
    pub const fn is_none(&self) -> bool {
        self.0 == 0
    }
}

numeric_id!(
    /// Identifier assigned by the payment service.
    PaymentId
);

numeric_id!(
    /// Product identifier understood by the stock service.
    ProductId
);

numeric_id!(
    /// Identifier of the customer placing the order.
    UserId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_id_default_is_none() {
        assert_eq!(OrderId::default(), OrderId::NONE);
        assert!(OrderId::default().is_none());
        assert!(!OrderId::new(42).is_none());
    }

    #[test]
    fn ids_serialize_as_plain_numbers() {
        assert_eq!(serde_json::to_string(&OrderId::new(42)).unwrap(), "42");
        let product: ProductId = serde_json::from_str("7").unwrap();
        assert_eq!(product, ProductId::new(7));
    }

    #[test]
    fn display_matches_raw_value() {
        assert_eq!(PaymentId::new(3).to_string(), "3");
        assert_eq!(u64::from(UserId::new(9)), 9);
    }
}
