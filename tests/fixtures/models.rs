/// A pet in the store.
///
/// @api-scenario default id name
/// @api-scenario view *id name tags
pub struct Pet {
    /// @var integer Unique id
    pub id: u64,
    /// @var string Display name
    pub name: String,
    /// @var Tag[] Attached tags
    pub tags: Vec<Tag>,
}

/// A label attached to pets.
///
/// @api-scenario view label
pub struct Tag {
    /// @var string Label text
    pub label: String,
}
