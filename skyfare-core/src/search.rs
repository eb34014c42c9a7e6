use serde::{Deserialize, Serialize};

/// One itinerary search as submitted by a caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub origin_city: String,
    pub dest_city: String,
    /// When true, connection itineraries are not considered at all.
    pub direct_only: bool,
    pub day_of_month: i32,
    pub num_itineraries: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_request_deserialization() {
        let json = r#"
            {
                "origin_city": "Seattle WA",
                "dest_city": "Boston MA",
                "direct_only": false,
                "day_of_month": 14,
                "num_itineraries": 5
            }
        "#;
        let req: SearchRequest = serde_json::from_str(json).expect("Failed to deserialize");
        assert_eq!(req.origin_city, "Seattle WA");
        assert_eq!(req.day_of_month, 14);
        assert!(!req.direct_only);
    }
}
