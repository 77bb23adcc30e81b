//! Static catalog of the regions whose weather is extracted.
//!
//! The catalog covers the administrative regions of the Federal District (Brasília).
//! Coordinates are approximate centroids and are only used to parameterize API calls.

/// A named geographic area with fixed coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    /// Unique, human-readable identifier. Also the `region` key in both stores.
    pub name: &'static str,
    pub latitude: f64,
    pub longitude: f64,
}

impl Region {
    pub const fn new(name: &'static str, latitude: f64, longitude: f64) -> Self {
        Self {
            name,
            latitude,
            longitude,
        }
    }
}

/// Every region the extraction job iterates over, in extraction order.
pub const REGIONS: [Region; 35] = [
    Region::new("Plano Piloto", -15.7833, -47.9167),
    Region::new("Asa Norte", -15.7633, -47.8833),
    Region::new("Asa Sul", -15.8067, -47.8833),
    Region::new("Taguatinga", -15.8333, -48.0667),
    Region::new("Ceilândia", -15.8167, -48.1167),
    Region::new("Samambaia", -15.8667, -48.0833),
    Region::new("Sobradinho", -15.65, -47.7833),
    Region::new("Planaltina", -15.6167, -47.65),
    Region::new("Gama", -16.0167, -48.0667),
    Region::new("Guará", -15.8167, -47.9833),
    Region::new("Núcleo Bandeirante", -15.8667, -47.9667),
    Region::new("Paranoá", -15.7667, -47.7833),
    Region::new("Itapoã", -15.75, -47.7667),
    Region::new("Jardim Botânico", -15.8667, -47.8),
    Region::new("Lago Sul", -15.8667, -47.8667),
    Region::new("Lago Norte", -15.7167, -47.8833),
    Region::new("Candangolândia", -15.85, -47.95),
    Region::new("Varjão", -15.7167, -47.8833),
    Region::new("SIA", -15.8, -47.9667),
    Region::new("Sudoeste", -15.7833, -47.9167),
    Region::new("Santa Maria", -16.0167, -47.9833),
    Region::new("São Sebastião", -15.9, -47.7667),
    Region::new("Recanto das Emas", -15.9167, -48.0667),
    Region::new("Riacho Fundo", -15.8833, -48.0167),
    Region::new("Riacho Fundo II", -15.9, -48.0333),
    Region::new("Estrutural", -15.7833, -47.9833),
    Region::new("Vicente Pires", -15.8, -48.0333),
    Region::new("Águas Claras", -15.8333, -48.0333),
    Region::new("Arniqueira", -15.85, -47.9667),
    Region::new("Brazlândia", -15.6667, -48.2),
    Region::new("Cruzeiro", -15.7833, -47.9333),
    Region::new("Fercal", -15.6, -47.8667),
    Region::new("Park Way", -15.9, -47.8167),
    Region::new("SCIA", -15.7833, -47.9667),
    Region::new("Sobradinho II", -15.6333, -47.8167),
];

/// Looks up a region of the catalog by its exact name.
pub fn find_region(name: &str) -> Option<Region> {
    REGIONS.iter().find(|r| r.name == name).copied()
}
