//! Module that contains known test accounts.

/// Define a test account with an address made of the given repeated byte.
macro_rules! test_account {
    ($doc:expr, $name:ident, $byte:expr) => {
        #[doc = " Test account "]
        #[doc=$doc]
        #[doc = "."]
        pub mod $name {
            use crate::types::address::Address;

            #[doc = " Test address "]
            #[doc=$doc]
            #[doc = "."]
            pub fn address() -> Address {
                Address::from_bytes(&[$byte; Address::SIZE]).unwrap()
            }
        }
    };
}

test_account!("A", alice, 0x0a);
test_account!("B", bob, 0x0b);
test_account!("C", charlie, 0x0c);
test_account!("D", dave, 0x0d);
