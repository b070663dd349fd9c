#[derive(Clone, Debug, PartialEq)]
pub struct Vehicle {
    pub id: u64,
    pub plate: String,
    pub capacity_kg: f64,
    pub is_rental: bool,
}
