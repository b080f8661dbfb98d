//! Park/species association behaviour through the public repositories

use parks_server::create_memory_pool;
use parks_server::db::repos::{
    LinkAnnotations, LinkRepo, NewPark, NewSighting, NewSpecies, ParkDetails, ParkRepo,
    SightingFilter, SightingRepo, SpeciesDetails, SpeciesFilter, SpeciesPatch, SpeciesRepo,
};
use parks_server::models::{Coordinates, Pagination, SightingProbability, SpeciesType};
use parks_server::DbError;
use sqlx::SqlitePool;

async fn park(pool: &SqlitePool, name: &str) -> i64 {
    ParkRepo::new(pool)
        .create(NewPark {
            name: name.into(),
            governorate: "Bizerte".into(),
            description: format!("{name} national park"),
            coordinates: Coordinates::new(37.1, 9.6).unwrap(),
            details: ParkDetails::default(),
        })
        .await
        .unwrap()
        .id
}

fn species(name: &str, species_type: SpeciesType) -> NewSpecies {
    NewSpecies {
        name: name.into(),
        scientific_name: format!("{name} sp."),
        species_type,
        description: "test species".into(),
        image_url: None,
        details: SpeciesDetails::default(),
    }
}

async fn link_count(pool: &SqlitePool) -> i64 {
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM park_species")
        .fetch_one(pool)
        .await
        .unwrap();
    n
}

#[tokio::test]
async fn create_links_only_existing_parks() {
    let pool = create_memory_pool().await.unwrap();
    let p1 = park(&pool, "Ichkeul").await;
    let missing = p1 + 100;

    let created = SpeciesRepo::new(&pool)
        .create(species("Gazelle", SpeciesType::Animal), &[p1, missing])
        .await
        .unwrap();

    assert_eq!(created.park_ids, vec![p1]);
    assert_eq!(link_count(&pool).await, 1);
}

#[tokio::test]
async fn duplicate_ids_create_one_link() {
    let pool = create_memory_pool().await.unwrap();
    let p1 = park(&pool, "Ichkeul").await;

    let created = SpeciesRepo::new(&pool)
        .create(species("Flamant", SpeciesType::Animal), &[p1, p1, p1])
        .await
        .unwrap();

    assert_eq!(created.park_ids, vec![p1]);
    assert_eq!(link_count(&pool).await, 1);
}

#[tokio::test]
async fn update_replaces_park_set() {
    let pool = create_memory_pool().await.unwrap();
    let p1 = park(&pool, "Ichkeul").await;
    let p2 = park(&pool, "Chaambi").await;
    let p3 = park(&pool, "Boukornine").await;
    let repo = SpeciesRepo::new(&pool);

    let created = repo
        .create(species("Pin", SpeciesType::Plant), &[p1, p2])
        .await
        .unwrap();

    let updated = repo
        .update(
            created.species.id,
            SpeciesPatch {
                park_ids: Some(vec![p2, p3]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.park_ids, vec![p2, p3]);

    // Same request again changes nothing
    let again = repo
        .update(
            created.species.id,
            SpeciesPatch {
                park_ids: Some(vec![p3, p2]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(again.park_ids, vec![p2, p3]);
    assert_eq!(link_count(&pool).await, 2);
}

#[tokio::test]
async fn absent_park_ids_leave_links_alone() {
    let pool = create_memory_pool().await.unwrap();
    let p1 = park(&pool, "Ichkeul").await;
    let repo = SpeciesRepo::new(&pool);
    let created = repo
        .create(species("Cerf", SpeciesType::Animal), &[p1])
        .await
        .unwrap();

    let updated = repo
        .update(
            created.species.id,
            SpeciesPatch {
                details: SpeciesDetails {
                    rarity: Some("rare".into()),
                    ..Default::default()
                },
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.park_ids, vec![p1]);
    assert_eq!(updated.species.rarity.as_deref(), Some("rare"));
}

#[tokio::test]
async fn empty_park_ids_unlink_everything() {
    let pool = create_memory_pool().await.unwrap();
    let p1 = park(&pool, "Ichkeul").await;
    let p2 = park(&pool, "Chaambi").await;
    let repo = SpeciesRepo::new(&pool);
    let created = repo
        .create(species("Cerf", SpeciesType::Animal), &[p1, p2])
        .await
        .unwrap();

    let updated = repo
        .update(
            created.species.id,
            SpeciesPatch {
                park_ids: Some(vec![]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(updated.park_ids.is_empty());
    assert!(LinkRepo::new(&pool).list_for_park(p1).await.unwrap().is_empty());
}

#[tokio::test]
async fn update_of_missing_species_is_not_found() {
    let pool = create_memory_pool().await.unwrap();
    let err = SpeciesRepo::new(&pool)
        .update(
            999,
            SpeciesPatch {
                park_ids: Some(vec![]),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NotFound { resource: "species", .. }));
}

#[tokio::test]
async fn delete_species_removes_links_and_sightings() {
    let pool = create_memory_pool().await.unwrap();
    let p1 = park(&pool, "Ichkeul").await;
    let repo = SpeciesRepo::new(&pool);
    let created = repo
        .create(species("Gazelle", SpeciesType::Animal), &[p1])
        .await
        .unwrap();
    SightingRepo::new(&pool)
        .create(NewSighting {
            park_id: p1,
            species_id: created.species.id,
            reporter_name: "Amira".into(),
            sighting_date: chrono::NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
            location: Coordinates::new(37.1, 9.6).unwrap(),
            photo_url: None,
            notes: None,
        })
        .await
        .unwrap();

    repo.delete(created.species.id).await.unwrap();

    assert_eq!(link_count(&pool).await, 0);
    let sightings = SightingRepo::new(&pool)
        .list(&SightingFilter::default(), Pagination::default())
        .await
        .unwrap();
    assert_eq!(sightings.total, 0);
    assert!(matches!(
        repo.get(created.species.id).await.unwrap_err(),
        DbError::NotFound { .. }
    ));
}

#[tokio::test]
async fn delete_park_removes_its_links_only() {
    let pool = create_memory_pool().await.unwrap();
    let p1 = park(&pool, "Ichkeul").await;
    let p2 = park(&pool, "Chaambi").await;
    let repo = SpeciesRepo::new(&pool);
    let created = repo
        .create(species("Pin", SpeciesType::Plant), &[p1, p2])
        .await
        .unwrap();

    ParkRepo::new(&pool).delete(p1).await.unwrap();

    let after = repo.get(created.species.id).await.unwrap();
    assert_eq!(after.park_ids, vec![p2]);
}

#[tokio::test]
async fn list_filters_combine() {
    let pool = create_memory_pool().await.unwrap();
    let p1 = park(&pool, "Ichkeul").await;
    let p2 = park(&pool, "Chaambi").await;
    let repo = SpeciesRepo::new(&pool);

    repo.create(species("Flamant", SpeciesType::Animal), &[p1])
        .await
        .unwrap();
    repo.create(species("Pin", SpeciesType::Plant), &[p1, p2])
        .await
        .unwrap();
    repo.create(species("Gazelle", SpeciesType::Animal), &[p2])
        .await
        .unwrap();

    let animals_at_p1 = repo
        .list(&SpeciesFilter {
            species_type: Some(SpeciesType::Animal),
            park_id: Some(p1),
            search: None,
        })
        .await
        .unwrap();
    let names: Vec<_> = animals_at_p1.iter().map(|s| s.species.name.as_str()).collect();
    assert_eq!(names, ["Flamant"]);

    // A species linked to several parks appears once, with all its parks
    let at_p2 = repo
        .list(&SpeciesFilter {
            park_id: Some(p2),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(at_p2.len(), 2);
    let pine = at_p2.iter().find(|s| s.species.name == "Pin").unwrap();
    assert_eq!(pine.park_ids, vec![p1, p2]);
}

#[tokio::test]
async fn list_for_park_has_no_duplicates() {
    let pool = create_memory_pool().await.unwrap();
    let p1 = park(&pool, "Ichkeul").await;
    let repo = SpeciesRepo::new(&pool);
    let created = repo
        .create(species("Flamant", SpeciesType::Animal), &[p1])
        .await
        .unwrap();
    repo.update(
        created.species.id,
        SpeciesPatch {
            park_ids: Some(vec![p1, p1]),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let listed = LinkRepo::new(&pool).list_for_park(p1).await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn list_for_missing_park_is_not_found() {
    let pool = create_memory_pool().await.unwrap();
    let err = LinkRepo::new(&pool).list_for_park(42).await.unwrap_err();
    assert!(matches!(err, DbError::NotFound { resource: "park", .. }));
}

#[tokio::test]
async fn annotations_survive_reconciliation() {
    let pool = create_memory_pool().await.unwrap();
    let p1 = park(&pool, "Ichkeul").await;
    let p2 = park(&pool, "Chaambi").await;
    let repo = SpeciesRepo::new(&pool);
    let created = repo
        .create(species("Flamant", SpeciesType::Animal), &[p1])
        .await
        .unwrap();

    LinkRepo::new(&pool)
        .set_annotations(
            p1,
            created.species.id,
            LinkAnnotations {
                population_estimate: Some("~2000".into()),
                sighting_probability: Some(SightingProbability::High),
                best_spots: vec!["Lac".into()],
            },
        )
        .await
        .unwrap();

    repo.update(
        created.species.id,
        SpeciesPatch {
            park_ids: Some(vec![p1, p2]),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let at_p1 = LinkRepo::new(&pool).list_for_park(p1).await.unwrap();
    assert_eq!(at_p1[0].population_estimate.as_deref(), Some("~2000"));
    assert_eq!(at_p1[0].sighting_probability, Some(SightingProbability::High));
}

#[tokio::test]
async fn annotating_missing_link_is_not_found() {
    let pool = create_memory_pool().await.unwrap();
    let p1 = park(&pool, "Ichkeul").await;
    let created = SpeciesRepo::new(&pool)
        .create(species("Pin", SpeciesType::Plant), &[])
        .await
        .unwrap();

    let err = LinkRepo::new(&pool)
        .set_annotations(p1, created.species.id, LinkAnnotations::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NotFound { .. }));
}
