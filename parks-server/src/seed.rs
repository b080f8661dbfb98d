//! Built-in sample dataset
//!
//! Loaded through the repositories so species links go through the same
//! path as API writes.

use sqlx::SqlitePool;
use tracing::info;

use crate::db::repos::{
    BadgeRepo, DbError, NewBadge, NewPark, NewSpecies, NewTrail, ParkDetails, ParkRepo,
    SpeciesDetails, SpeciesRepo, TrailRepo,
};
use crate::models::{Coordinates, Difficulty, SpeciesType, TrailType, ValidationError};

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error("invalid seed data: {0}")]
    Data(#[from] ValidationError),
}

impl From<sqlx::Error> for SeedError {
    fn from(e: sqlx::Error) -> Self {
        Self::Db(DbError::from(e))
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedSummary {
    pub parks: usize,
    pub species: usize,
    pub links: usize,
    pub trails: usize,
    pub badges: usize,
    /// Data already present and no reset requested
    pub skipped: bool,
}

/// Tables in dependency order, children first
const TABLES: [&str; 7] = [
    "park_species",
    "sightings",
    "reviews",
    "trails",
    "species",
    "parks",
    "badges",
];

/// Remove every row from every table.
pub async fn clear(pool: &SqlitePool) -> Result<(), SeedError> {
    let mut tx = pool.begin().await?;
    for table in TABLES {
        sqlx::query(&format!("DELETE FROM {table}"))
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;
    Ok(())
}

struct ParkSeed {
    name: &'static str,
    governorate: &'static str,
    description: &'static str,
    lat: f64,
    lng: f64,
    area_km2: f64,
    activities: &'static [&'static str],
}

const PARKS: [ParkSeed; 4] = [
    ParkSeed {
        name: "Parc national de l'Ichkeul",
        governorate: "Bizerte",
        description: "Parc national autour du lac Ichkeul, zone humide importante pour les oiseaux migrateurs.",
        lat: 37.169,
        lng: 9.672,
        area_km2: 126.0,
        activities: &["observation des oiseaux", "randonnée"],
    },
    ParkSeed {
        name: "Parc national de Chaambi",
        governorate: "Kasserine",
        description: "Parc de montagne autour du Djebel Chaambi, abritant une faune et flore de haute altitude.",
        lat: 35.233,
        lng: 8.672,
        area_km2: 67.0,
        activities: &["randonnée", "alpinisme"],
    },
    ParkSeed {
        name: "Parc national de Boukornine",
        governorate: "Ben Arous",
        description: "Massif forestier aux portes de Tunis, dominé par le Djebel Boukornine.",
        lat: 36.703,
        lng: 10.349,
        area_km2: 19.4,
        activities: &["randonnée", "pique-nique"],
    },
    ParkSeed {
        name: "Parc national d'El Feija",
        governorate: "Jendouba",
        description: "Forêt de chênes zéen et lièges de la Kroumirie, refuge du cerf de Barbarie.",
        lat: 36.497,
        lng: 8.319,
        area_km2: 26.3,
        activities: &["observation de la faune", "randonnée"],
    },
];

struct SpeciesSeed {
    name: &'static str,
    scientific_name: &'static str,
    species_type: SpeciesType,
    description: &'static str,
    threats: &'static str,
    /// Indexes into `PARKS`
    parks: &'static [usize],
}

const SPECIES: [SpeciesSeed; 4] = [
    SpeciesSeed {
        name: "Gazelle de Cuvier",
        scientific_name: "Gazella cuvieri",
        species_type: SpeciesType::Animal,
        description: "Antilope présente dans certains parcs du centre et du sud tunisien.",
        threats: "Braconnage, perte d'habitat, dérangement par les activités humaines.",
        parks: &[1],
    },
    SpeciesSeed {
        name: "Cerf de Barbarie",
        scientific_name: "Cervus elaphus barbarus",
        species_type: SpeciesType::Animal,
        description: "Sous-espèce de cerf des massifs forestiers du nord-ouest tunisien.",
        threats: "Fragmentation des forêts, braconnage, incendies.",
        parks: &[0, 3],
    },
    SpeciesSeed {
        name: "Pin d'Alep",
        scientific_name: "Pinus halepensis",
        species_type: SpeciesType::Plant,
        description: "Espèce de pin très répandue dans les forêts tunisiennes.",
        threats: "Incendies répétés, sécheresse, coupes abusives.",
        parks: &[0, 1, 2],
    },
    SpeciesSeed {
        name: "Flamant rose",
        scientific_name: "Phoenicopterus roseus",
        species_type: SpeciesType::Animal,
        description: "Grand échassier hivernant sur les zones humides du nord.",
        threats: "Assèchement des zones humides, dérangement.",
        parks: &[0],
    },
];

/// Load the sample dataset.
///
/// Without `reset`, a database that already has parks is left alone.
pub async fn seed(pool: &SqlitePool, reset: bool) -> Result<SeedSummary, SeedError> {
    if reset {
        clear(pool).await?;
        info!("Cleared existing data");
    } else {
        let (existing,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM parks")
            .fetch_one(pool)
            .await?;
        if existing > 0 {
            info!(existing, "Database already has parks, skipping seed");
            return Ok(SeedSummary {
                skipped: true,
                ..Default::default()
            });
        }
    }

    let mut summary = SeedSummary::default();

    let parks = ParkRepo::new(pool);
    let mut park_ids = Vec::with_capacity(PARKS.len());
    for p in &PARKS {
        let park = parks
            .create(NewPark {
                name: p.name.into(),
                governorate: p.governorate.into(),
                description: p.description.into(),
                coordinates: Coordinates::new(p.lat, p.lng)?,
                details: ParkDetails {
                    area_km2: Some(p.area_km2),
                    activities: Some(p.activities.iter().map(|a| a.to_string()).collect()),
                    ..Default::default()
                },
            })
            .await?;
        park_ids.push(park.id);
    }
    summary.parks = park_ids.len();

    let species = SpeciesRepo::new(pool);
    for s in &SPECIES {
        let linked: Vec<i64> = s.parks.iter().map(|i| park_ids[*i]).collect();
        let created = species
            .create(
                NewSpecies {
                    name: s.name.into(),
                    scientific_name: s.scientific_name.into(),
                    species_type: s.species_type,
                    description: s.description.into(),
                    image_url: None,
                    details: SpeciesDetails {
                        threats: Some(s.threats.into()),
                        ..Default::default()
                    },
                },
                &linked,
            )
            .await?;
        summary.species += 1;
        summary.links += created.park_ids.len();
    }

    let trails = TrailRepo::new(pool);
    trails
        .create(
            park_ids[0],
            NewTrail {
                name: "Sentier du Djebel Ichkeul".into(),
                description: "Montée vers le sommet avec vue sur le lac et les marais.".into(),
                difficulty: Difficulty::Moderate,
                length_km: 7.5,
                duration_hours: 3.0,
                elevation_gain: Some(480),
                trail_type: TrailType::OutAndBack,
                surface: Some("terre".into()),
                gpx_data: None,
                waypoints: vec![],
                highlights: vec!["Vue sur le lac".into(), "Éco-musée".into()],
            },
        )
        .await?;
    trails
        .create(
            park_ids[1],
            NewTrail {
                name: "Boucle du sommet de Chaambi".into(),
                description: "Ascension du point culminant de la Tunisie.".into(),
                difficulty: Difficulty::Hard,
                length_km: 14.0,
                duration_hours: 6.0,
                elevation_gain: Some(900),
                trail_type: TrailType::Loop,
                surface: Some("rocaille".into()),
                gpx_data: None,
                waypoints: vec![],
                highlights: vec!["Point culminant du pays".into()],
            },
        )
        .await?;
    summary.trails = 2;

    let badges = BadgeRepo::new(pool);
    for (name, description, icon, requirement, points) in [
        ("Explorateur", "Visiter trois parcs nationaux", "compass", "visit_3_parks", 50),
        ("Ornithologue", "Signaler un oiseau rare", "binoculars", "report_bird", 30),
    ] {
        badges
            .create(NewBadge {
                name: name.into(),
                description: description.into(),
                icon: icon.into(),
                requirement: requirement.into(),
                points,
            })
            .await?;
        summary.badges += 1;
    }

    info!(
        parks = summary.parks,
        species = summary.species,
        links = summary.links,
        "Seeded sample data"
    );
    Ok(summary)
}
