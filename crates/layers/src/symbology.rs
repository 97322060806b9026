use serde::Serialize;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeSize {
    Small,
    Medium,
    Large,
}

/// Visual for a count badge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BadgeIcon {
    pub size: BadgeSize,
    pub label: String,
    pub diameter_px: f32,
}

impl BadgeIcon {
    /// Size classes break at 10 and 100 members.
    pub fn for_count(count: usize) -> Self {
        let (size, diameter_px) = match count {
            0..10 => (BadgeSize::Small, 30.0),
            10..100 => (BadgeSize::Medium, 40.0),
            _ => (BadgeSize::Large, 50.0),
        };
        Self {
            size,
            label: count.to_string(),
            diameter_px,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BadgeIcon, BadgeSize};

    #[test]
    fn size_classes_break_at_powers_of_ten() {
        assert_eq!(BadgeIcon::for_count(9).size, BadgeSize::Small);
        assert_eq!(BadgeIcon::for_count(10).size, BadgeSize::Medium);
        assert_eq!(BadgeIcon::for_count(99).size, BadgeSize::Medium);
        assert_eq!(BadgeIcon::for_count(100).size, BadgeSize::Large);
        assert_eq!(BadgeIcon::for_count(12).label, "12");
    }
}
