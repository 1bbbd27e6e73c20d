//! Fixed deployment policy: partition names, the install manifest,
//! classification patterns, routing and eviction limits.
//!
//! Partition names are versioned. Changing one requires updating
//! [`CURRENT_CACHES`] so activation garbage-collects the old generation.

use super::classify::ResourceClass;

pub const STATIC_CACHE: &str = "static-v1";
pub const DYNAMIC_CACHE: &str = "dynamic-v1";
pub const IMAGE_CACHE: &str = "images-v1";

/// Partitions that survive activation.
pub const CURRENT_CACHES: [&str; 3] = [STATIC_CACHE, DYNAMIC_CACHE, IMAGE_CACHE];

/// Paths pre-cached into [`STATIC_CACHE`] on install.
pub const PRECACHE_MANIFEST: &[&str] = &[
    "/",
    "/game/",
    "/news/",
    "/about/",
    "/css/main.css",
    "/js/main.js",
    "/js/lazy-loading.js",
    "/images/placeholder.jpg",
    "/manifest.json",
];

pub const PLACEHOLDER_IMAGE: &str = "/images/placeholder.jpg";
pub const OFFLINE_DOCUMENT: &str = "/offline.html";
pub const OFFLINE_MESSAGE: &str = "オフラインです";

/// Eviction limits applied on `CLEAN_CACHE`.
pub const EVICTION_LIMITS: [(&str, usize); 2] = [(DYNAMIC_CACHE, 50), (IMAGE_CACHE, 100)];

/// Ordered classification rules; the first class with a matching pattern wins.
pub const CLASSIFICATION_RULES: &[(ResourceClass, &[&str])] = &[
    (ResourceClass::Static, &[r"\.css$", r"\.js$", r"\.woff2?$", r"\.ttf$", r"\.eot$"]),
    (ResourceClass::Images, &[r"\.jpg$", r"\.jpeg$", r"\.png$", r"\.webp$", r"\.svg$", r"\.gif$"]),
    (ResourceClass::Html, &[r"\.html$", r"/$"]),
    (ResourceClass::Api, &[r"/api/"]),
];

/// How a resource class is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    CacheFirst,
    NetworkFirst,
}

/// Strategy and partition bound to a resource class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub strategy: Strategy,
    pub partition: &'static str,
}

pub fn route(class: ResourceClass) -> Route {
    match class {
        ResourceClass::Static => Route { strategy: Strategy::CacheFirst, partition: STATIC_CACHE },
        ResourceClass::Images => Route { strategy: Strategy::CacheFirst, partition: IMAGE_CACHE },
        ResourceClass::Html | ResourceClass::Api | ResourceClass::Default => {
            Route { strategy: Strategy::NetworkFirst, partition: DYNAMIC_CACHE }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_table() {
        assert_eq!(route(ResourceClass::Static), Route { strategy: Strategy::CacheFirst, partition: "static-v1" });
        assert_eq!(route(ResourceClass::Images), Route { strategy: Strategy::CacheFirst, partition: "images-v1" });
        for class in [ResourceClass::Html, ResourceClass::Api, ResourceClass::Default] {
            assert_eq!(route(class), Route { strategy: Strategy::NetworkFirst, partition: "dynamic-v1" });
        }
    }

    #[test]
    fn test_manifest_includes_placeholder() {
        assert!(PRECACHE_MANIFEST.contains(&PLACEHOLDER_IMAGE));
    }
}
