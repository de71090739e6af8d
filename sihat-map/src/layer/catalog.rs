//! Descriptor sets and the filter panel layout.

use super::descriptor::{
    CirclePaint, DescriptorError, FillPaint, IconRef, LayerDescriptor, PaintRules, ZoomRange,
};
use super::expr::{ColorRamp, NumericExpr};
use crate::interaction::{FieldFormat, PopupField, PopupTemplate};
use std::collections::HashSet;

/// One toggle in the filter panel.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryItem {
    /// UI id; a descriptor id or alias when a dataset exists
    pub id: String,
    pub label: String,
    pub color: String,
}

/// A group of toggles in the filter panel.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: String,
    pub title: String,
    /// Announced but without datasets yet
    pub coming_soon: bool,
    pub items: Vec<CategoryItem>,
}

impl Category {
    fn new(id: &str, title: &str, coming_soon: bool, items: &[(&str, &str, &str)]) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            coming_soon,
            items: items
                .iter()
                .map(|&(id, label, color)| CategoryItem {
                    id: id.to_string(),
                    label: label.to_string(),
                    color: color.to_string(),
                })
                .collect(),
        }
    }
}

/// A validated set of layer descriptors.
///
/// Ids and aliases are unique across the whole set.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerCatalog {
    descriptors: Vec<LayerDescriptor>,
    categories: Vec<Category>,
}

impl LayerCatalog {
    pub fn new(
        descriptors: Vec<LayerDescriptor>,
        categories: Vec<Category>,
    ) -> Result<Self, DescriptorError> {
        let mut seen = HashSet::new();
        for descriptor in &descriptors {
            for key in std::iter::once(descriptor.id()).chain(descriptor.aliases().iter().map(String::as_str)) {
                if !seen.insert(key.to_string()) {
                    return Err(DescriptorError::Duplicate(key.to_string()));
                }
            }
        }
        Ok(Self {
            descriptors,
            categories,
        })
    }

    /// Descriptor by canonical id.
    pub fn get(&self, id: &str) -> Option<&LayerDescriptor> {
        self.descriptors.iter().find(|d| d.id() == id)
    }

    /// Descriptor by id or alias.
    pub fn resolve(&self, id_or_alias: &str) -> Option<&LayerDescriptor> {
        self.get(id_or_alias).or_else(|| {
            self.descriptors
                .iter()
                .find(|d| d.aliases().iter().any(|a| a == id_or_alias))
        })
    }

    /// Whether the filter panel lists this id.
    pub fn is_panel_item(&self, id: &str) -> bool {
        self.categories
            .iter()
            .flat_map(|c| c.items.iter())
            .any(|item| item.id == id)
    }

    pub fn descriptors(&self) -> &[LayerDescriptor] {
        &self.descriptors
    }

    pub fn ids(&self) -> Vec<&str> {
        self.descriptors.iter().map(LayerDescriptor::id).collect()
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// The Banjarbaru health map.
    pub fn banjarbaru() -> Result<Self, DescriptorError> {
        let facility_popup = || {
            PopupTemplate::new(&["namobj", "nama", "NAMA"])
                .field(PopupField::text("Jenis", "remark"))
                .field(PopupField::text("Kecamatan", "wadmkc").in_summary())
                .field(PopupField::text("Kelurahan", "wadmkd"))
                .field(PopupField::text("Alamat", "alamat"))
        };
        let circle = |id: &str,
                      label: &str,
                      url: &str,
                      radius: f64,
                      color: &str,
                      minzoom: f64|
         -> Result<LayerDescriptor, DescriptorError> {
            LayerDescriptor::new(
                id,
                label,
                url,
                PaintRules::Circle(CirclePaint::new(radius, color)),
                ZoomRange::from_min(minzoom)?,
            )
        };

        let hospitals = LayerDescriptor::new(
            "hospitals",
            "Rumah Sakit",
            "/data/rumah_sakit.json",
            PaintRules::Symbol {
                icon: IconRef {
                    name: "hospital-icon".into(),
                    asset_url: "/assets/hospital.png".into(),
                    max_bitmap_dimension: 128,
                    display_scale: 0.25,
                },
                allow_overlap: true,
            },
            ZoomRange::from_min(8.0)?,
        )?
        .with_popup(facility_popup())
        .with_alias("rumahsakit")?;

        let puskesmas = circle("puskesmas", "Puskesmas", "/data/puskesmas.json", 5.0, "#3498DB", 8.0)?
            .with_popup(facility_popup());

        let clinics = circle("clinics", "Klinik", "/data/klinik.json", 4.5, "#9B59B6", 9.0)?
            .with_popup(facility_popup())
            .with_alias("klinik")?;

        let pharmacies = circle("pharmacies", "Apotek", "/data/apotek.json", 4.0, "#1BA351", 10.0)?
            .with_popup(facility_popup())
            .with_alias("apotek")?;

        let population = circle(
            "population",
            "Kepadatan Penduduk",
            "/data/kepadatan_penduduk.json",
            4.5,
            "#2d2d2dff",
            9.0,
        )?
        .with_popup(
            PopupTemplate::new(&["namobj"])
                .field(PopupField::text("Kecamatan", "wadmkc"))
                .field(PopupField::number("Penduduk", "jlhpendudu").in_summary())
                .field(PopupField::number("Kepadatan (jiwa/km²)", "kepadatan").in_summary()),
        );

        let children = circle(
            "children",
            "Sebaran Balita",
            "/data/sebaran_balita.json",
            4.5,
            "#e856b7ff",
            9.0,
        )?
        .with_popup(
            PopupTemplate::new(&["namobj"])
                .field(PopupField::text("Kecamatan", "wadmkc"))
                .field(PopupField::number("Jumlah balita", "jlhbalita").in_summary()),
        );

        let homecare = circle(
            "homecare",
            "HomeCare Lansia",
            "/data/home_care_lansia.json",
            4.5,
            "#f2c193ff",
            9.0,
        )?
        .with_popup(facility_popup());

        let elderly = elderly()?;

        let categories = vec![
            Category::new(
                "health-facilities",
                "Fasilitas Kesehatan",
                false,
                &[
                    ("rumahsakit", "Rumah Sakit", "#3498DB"),
                    ("puskesmas", "Puskesmas", "#1BA351"),
                    ("klinik", "Klinik", "#d843e8ff"),
                    ("apotek", "Apotek", "#090e97ff"),
                    ("ambulances", "Ambulan (Next Update)", "#ffffffff"),
                    ("posyandu", "Posyandu (Next Update)", "#ffffffff"),
                    ("homecare", "HomeCare Lansia", "#f2c193ff"),
                ],
            ),
            Category::new(
                "environment-health",
                "Lingkungan dan Penyakit",
                true,
                &[
                    ("airquality", "Kualitas Udara", "#95A5A6"),
                    ("heat-island", "Panas Perkotaan", "#F39C12"),
                    ("dengue-zone", "Daerah Rawan DBD", "#E38BCF"),
                    ("bank-sampah", "Bank Sampah", "#1BA180"),
                    ("tps", "TPS", "#1BA360"),
                    ("jalan-berlubang", "Jalan Berlubang", "#000000"),
                    ("genangan-air", "Genangan Air", "#00AEEF"),
                ],
            ),
            Category::new(
                "demographics",
                "Data Demografis",
                false,
                &[
                    ("population", "Kepadatan Penduduk", "#34495E"),
                    ("children", "Sebaran Balita", "#FF6B9D"),
                    ("elderly", "Sebaran Lansia", "#8E44AD"),
                    ("disability", "Sebaran Disabilitas", "#00AEEF"),
                ],
            ),
        ];

        Self::new(
            vec![
                hospitals, puskesmas, clinics, pharmacies, population, children, homecare,
                elderly,
            ],
            categories,
        )
    }
}

/// Five-year age bands of the census attribute table, youngest first.
const AGE_BANDS: [&str; 16] = [
    "00__04", "05__09", "10__14", "15__19", "20__24", "25__29", "30__34", "35__39", "40__44",
    "45__49", "50__54", "55__59", "60__64", "65__69", "70__74", ">75",
];

/// Bands aged 60 and over.
const ELDERLY_BANDS: [&str; 4] = ["60__64", "65__69", "70__74", ">75"];

/// Choropleth of the share of residents aged 60 and over.
fn elderly() -> Result<LayerDescriptor, DescriptorError> {
    let ratio = NumericExpr::ratio(NumericExpr::sum(&ELDERLY_BANDS), NumericExpr::sum(&AGE_BANDS));

    let paint = PaintRules::Fill(FillPaint {
        value: ratio.clone(),
        ramp: ColorRamp::new(&[
            (0.05, "#E8F5E9"),
            (0.10, "#C8E6C9"),
            (0.15, "#81C784"),
            (0.20, "#4CAF50"),
            (0.30, "#2E7D32"),
        ])?,
        opacity: 0.6,
        outline_color: "#2E7D32".into(),
    });

    let popup = PopupTemplate::new(&["namobj"])
        .field(PopupField::text("Kec.", "wadmkc").in_summary())
        .field(PopupField::computed(
            "Total penduduk",
            NumericExpr::sum(&AGE_BANDS),
            FieldFormat::Number(0),
        ))
        .field(
            PopupField::computed(
                "Total lansia (≥60)",
                NumericExpr::sum(&ELDERLY_BANDS),
                FieldFormat::Number(0),
            )
            .in_summary(),
        )
        .field(PopupField::computed("Proporsi lansia", ratio, FieldFormat::Percent(1)).in_summary())
        .field(PopupField::count("60–64", "60__64"))
        .field(PopupField::count("65–69", "65__69"))
        .field(PopupField::count("70–74", "70__74"))
        .field(PopupField::count(">75", ">75"));

    Ok(LayerDescriptor::new(
        "elderly",
        "Sebaran Lansia",
        "/data/sebaran_lansia.json",
        paint,
        ZoomRange::new(Some(0.0), Some(22.0))?,
    )?
    .with_popup(popup))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RenderMode;
    use crate::interaction::PopupDetail;
    use serde_json::json;

    #[test]
    fn test_banjarbaru_catalog_builds() {
        let catalog = LayerCatalog::banjarbaru().unwrap();
        assert_eq!(
            catalog.ids(),
            vec![
                "hospitals",
                "puskesmas",
                "clinics",
                "pharmacies",
                "population",
                "children",
                "homecare",
                "elderly"
            ]
        );
        assert_eq!(
            catalog.get("hospitals").unwrap().render_mode(),
            RenderMode::Symbol
        );
        assert_eq!(catalog.get("elderly").unwrap().render_mode(), RenderMode::Fill);
        assert_eq!(catalog.categories().len(), 3);
    }

    #[test]
    fn test_panel_ids_resolve_through_aliases() {
        let catalog = LayerCatalog::banjarbaru().unwrap();
        assert_eq!(catalog.resolve("rumahsakit").unwrap().id(), "hospitals");
        assert_eq!(catalog.resolve("klinik").unwrap().id(), "clinics");
        assert_eq!(catalog.resolve("apotek").unwrap().id(), "pharmacies");
        assert!(catalog.resolve("ambulances").is_none());
        assert!(catalog.is_panel_item("ambulances"));
        assert!(!catalog.is_panel_item("volcanoes"));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let make = |id: &str| {
            LayerDescriptor::new(
                id,
                "X",
                "/x.json",
                PaintRules::Circle(CirclePaint::new(1.0, "#000")),
                ZoomRange::any(),
            )
            .unwrap()
        };
        assert_eq!(
            LayerCatalog::new(vec![make("a"), make("a")], vec![]),
            Err(DescriptorError::Duplicate("a".into()))
        );
        let aliased = make("b").with_alias("a").unwrap();
        assert!(LayerCatalog::new(vec![make("a"), aliased], vec![]).is_err());
    }

    #[test]
    fn test_elderly_popup_computes_ratio() {
        let catalog = LayerCatalog::banjarbaru().unwrap();
        let template = catalog.get("elderly").unwrap().popup().unwrap();
        let mut properties = json!({"namobj": "Guntung Manggis", "wadmkc": "Landasan Ulin"});
        for band in AGE_BANDS {
            properties[band] = json!(100);
        }
        properties["60__64"] = json!(400);
        let properties = properties.as_object().cloned().unwrap();

        let html = template.render(&properties, PopupDetail::Full);
        assert!(html.contains("<b>Total penduduk</b> 1.900"));
        assert!(html.contains("<b>Total lansia (≥60)</b> 700"));
        assert!(html.contains("<b>Proporsi lansia</b> 36,8%"));
        assert!(html.contains("<b>&gt;75</b> 100"));
    }

    #[test]
    fn test_elderly_popup_without_population_shows_placeholder() {
        let catalog = LayerCatalog::banjarbaru().unwrap();
        let template = catalog.get("elderly").unwrap().popup().unwrap();
        let html = template.render(&serde_json::Map::new(), PopupDetail::Summary);
        assert!(html.contains("<b>Proporsi lansia</b> -"));
        assert!(html.contains("<b>Total lansia (≥60)</b> 0"));
    }

    #[test]
    fn test_elderly_popup_missing_bands_read_as_zero() {
        let catalog = LayerCatalog::banjarbaru().unwrap();
        let template = catalog.get("elderly").unwrap().popup().unwrap();
        let properties = json!({"namobj": "Sungai Besar", "65__69": 12})
            .as_object()
            .cloned()
            .unwrap();

        let html = template.render(&properties, PopupDetail::Full);
        assert!(html.contains("<b>60–64</b> 0"));
        assert!(html.contains("<b>65–69</b> 12"));
        assert!(html.contains("<b>&gt;75</b> 0"));
    }
}
