use crate::types::{PhoneNumber, RegionClass};

/// Regional carriers to try, per region class, once the chat channel is exhausted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackOrder {
    russia: Vec<String>,
    international: Vec<String>,
}

impl Default for FallbackOrder {
    fn default() -> Self {
        Self {
            russia: vec!["green".to_string(), "aero".to_string()],
            international: vec!["twilio".to_string()],
        }
    }
}

impl FallbackOrder {
    pub fn new<I, S>(russia: I, international: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            russia: russia.into_iter().map(Into::into).collect(),
            international: international.into_iter().map(Into::into).collect(),
        }
    }

    pub fn for_region(&self, region: RegionClass) -> &[String] {
        match region {
            RegionClass::Russia => &self.russia,
            RegionClass::International => &self.international,
        }
    }

    pub fn for_phone(&self, phone: &PhoneNumber) -> &[String] {
        self.for_region(phone.region())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_order() {
        let order = FallbackOrder::default();
        let ru = PhoneNumber::new("+79998887766").unwrap();
        let us = PhoneNumber::new("+14155550123").unwrap();
        assert_eq!(order.for_phone(&ru), ["green", "aero"]);
        assert_eq!(order.for_phone(&us), ["twilio"]);
    }

    #[test]
    fn test_custom_order() {
        let order = FallbackOrder::new(vec!["aero"], vec![]);
        assert_eq!(order.for_region(RegionClass::Russia), ["aero"]);
        assert!(order.for_region(RegionClass::International).is_empty());
    }
}
