macro_rules! v1_path {
    ($path:literal) => {
        concat!("/api/v1", $path)
    };
}

/// Versioned API route definitions.
pub mod v1 {
    pub const HEALTH: &str = v1_path!("/health");

    pub mod courses {
        pub const ENROLL: &str = v1_path!("/courses/{id}/enroll");
        pub const PROGRESS: &str = v1_path!("/courses/{id}/progress");
        pub const EVALUATE: &str = v1_path!("/courses/{id}/evaluate");
        pub const CERTIFICATE: &str = v1_path!("/courses/{id}/certificate");
    }

    pub mod enrollments {
        pub const COLLECTION: &str = v1_path!("/enrollments");
    }

    pub mod videos {
        pub const PROGRESS: &str = v1_path!("/videos/{id}/progress");
        pub const ENDED: &str = v1_path!("/videos/{id}/ended");
    }
}

/// Substitutes `{id}` in a route template.
pub fn with_id(template: &str, id: impl std::fmt::Display) -> String {
    template.replace("{id}", &id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_are_versioned() {
        assert_eq!(v1::courses::ENROLL, "/api/v1/courses/{id}/enroll");
        assert_eq!(
            with_id(v1::videos::ENDED, 7),
            "/api/v1/videos/7/ended"
        );
    }
}
