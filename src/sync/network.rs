/// The affiliate networks with a dedicated sync integration. Routing is an
/// explicit registry over the program's free-text network label rather than
/// scattered string comparisons; anything that matches no known label is
/// `Unregistered` and synced through the generic scraping adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkKind {
    AmazonAssociates,
    ShareASale,
    CommissionJunction,
    /// No dedicated integration; synced through the generic scraping adapter.
    Unregistered,
}

impl NetworkKind {
    /// Case-insensitive match of a program's network label against the known
    /// network names. Substring containment is intentional: labels like
    /// "Amazon Associates (US)" still route to the Amazon adapter.
    pub fn from_name(name: &str) -> Self {
        let name = name.trim().to_lowercase();
        if name.contains("amazon") {
            NetworkKind::AmazonAssociates
        } else if name.contains("shareasale") {
            NetworkKind::ShareASale
        } else if name.contains("commission junction") || name.contains("cj affiliate") {
            NetworkKind::CommissionJunction
        } else {
            NetworkKind::Unregistered
        }
    }

}
