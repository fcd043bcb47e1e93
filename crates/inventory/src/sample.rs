use crate::item::ItemFields;

/// The demo catalogue a fresh dashboard starts with.
///
/// Statuses are not part of the sample; they follow from stock like any other item.
pub fn sample_items() -> Vec<ItemFields> {
    vec![
        ItemFields::new("Drone Model X1", "Electronics", 299.99, 45),
        ItemFields::new("Propeller Set", "Parts", 24.99, 120),
        ItemFields::new("Battery Pack", "Power", 89.99, 30),
        ItemFields::new("Camera Module", "Electronics", 199.99, 0),
        ItemFields::new("Controller", "Accessories", 149.99, 25),
    ]
}
