use crate::models::Pet;

/// Pet management endpoints.
///
/// @api-path /pets/{id}
/// @api-tags pets
pub struct PetController;

impl PetController {
    /// Returns one pet.
    ///
    /// Fetches a single pet by its id.
    ///
    /// @api-method get
    /// @api-response 200 models::Pet|view The pet
    /// @api-response 404 {"error":"not found"} Pet missing
    pub fn view(&self) -> Pet {
        unimplemented!()
    }

    /// Uploads a photo for the pet.
    ///
    /// @api-method post
    /// @api-path /photo
    /// @api-param * file in:formData name:photo The photo file
    /// @api-param string in:header name:x-token Auth token
    /// @api-response 201 created
    pub fn upload(&self) {}

    /// Not part of the API surface.
    pub fn validate(&self) -> bool {
        true
    }
}
