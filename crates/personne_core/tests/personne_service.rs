use chrono::NaiveDate;
use personne_core::db::open_db_in_memory;
use personne_core::{
    PersonneInput, PersonneSearch, PersonneService, PersonneServiceError,
    SqlitePersonneRepository,
};
use rusqlite::Connection;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn today() -> NaiveDate {
    date(2024, 6, 15)
}

fn service(conn: &Connection) -> PersonneService<SqlitePersonneRepository<'_>> {
    PersonneService::new(SqlitePersonneRepository::try_new(conn).unwrap()).with_today(today())
}

fn input(nom: &str, prenom: &str, telephone: Option<&str>) -> PersonneInput {
    PersonneInput {
        nom: Some(nom.to_string()),
        prenom: Some(prenom.to_string()),
        telephone: telephone.map(str::to_string),
        ..PersonneInput::default()
    }
}

#[test]
fn create_normalizes_every_text_field() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let created = service
        .create(&PersonneInput {
            nom: Some("dupont".to_string()),
            prenom: Some("MARIE".to_string()),
            adresse: Some("  3 place du Marché  ".to_string()),
            telephone: Some("06 12 34 56 78".to_string()),
            date_naissance: Some(date(1990, 1, 1)),
        })
        .unwrap();

    assert_eq!(created.id, 1);
    assert_eq!(created.nom, "DUPONT");
    assert_eq!(created.prenom, "Marie");
    assert_eq!(created.adresse.as_deref(), Some("3 place du Marché"));
    assert_eq!(created.telephone.as_deref(), Some("0612345678"));
    assert_eq!(created.date_naissance, Some(date(1990, 1, 1)));
    assert_eq!(service.find_by_id(created.id).unwrap(), created);
}

#[test]
fn create_rejects_phone_equal_after_whitespace_stripping() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    service
        .create(&input("dupont", "marie", Some("0612345678")))
        .unwrap();

    let err = service
        .create(&input("durand", "paul", Some("06 12 34 56 78")))
        .unwrap_err();
    assert!(matches!(err, PersonneServiceError::DuplicatePhone(ref phone) if phone == "0612345678"));
}

#[test]
fn create_accepts_phone_that_only_contains_a_stored_phone() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    service
        .create(&input("dupont", "marie", Some("0612345678")))
        .unwrap();

    let created = service
        .create(&input("durand", "paul", Some("061234567")))
        .unwrap();
    assert_eq!(created.telephone.as_deref(), Some("061234567"));
}

#[test]
fn create_rejects_future_birth_date() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let mut future = input("dupont", "marie", None);
    future.date_naissance = Some(date(2024, 6, 16));
    let err = service.create(&future).unwrap_err();
    assert!(matches!(err, PersonneServiceError::InvalidBirthDate(d) if d == date(2024, 6, 16)));
}

#[test]
fn create_rejects_age_under_one_year() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let mut baby = input("dupont", "lea", None);
    baby.date_naissance = Some(date(2023, 6, 16));
    let err = service.create(&baby).unwrap_err();
    assert!(matches!(err, PersonneServiceError::TooYoung(_)));

    baby.date_naissance = Some(date(2023, 6, 15));
    assert!(service.create(&baby).is_ok());
}

#[test]
fn create_requires_names() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let err = service.create(&input("   ", "marie", None)).unwrap_err();
    assert!(matches!(err, PersonneServiceError::InvalidInput(_)));

    let missing_prenom = PersonneInput {
        nom: Some("dupont".to_string()),
        ..PersonneInput::default()
    };
    let err = service.create(&missing_prenom).unwrap_err();
    assert!(matches!(err, PersonneServiceError::InvalidInput(_)));
    assert!(service.find_all().unwrap().is_empty());
}

#[test]
fn blank_phone_and_address_are_stored_as_absent() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let mut blank = input("dupont", "marie", Some("   "));
    blank.adresse = Some(" ".to_string());
    let first = service.create(&blank).unwrap();
    let second = service.create(&blank).unwrap();

    assert_eq!(first.telephone, None);
    assert_eq!(first.adresse, None);
    assert_eq!(second.id, 2);
}

#[test]
fn missing_ids_report_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    assert!(matches!(
        service.find_by_id(7).unwrap_err(),
        PersonneServiceError::NotFound(7)
    ));
    assert!(matches!(
        service.update(7, &input("dupont", "marie", None)).unwrap_err(),
        PersonneServiceError::NotFound(7)
    ));
    assert!(matches!(
        service.delete(7).unwrap_err(),
        PersonneServiceError::NotFound(7)
    ));
}

#[test]
fn update_requires_names() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let created = service.create(&input("dupont", "marie", None)).unwrap();

    let err = service
        .update(created.id, &input("", "marie", None))
        .unwrap_err();
    assert!(matches!(err, PersonneServiceError::InvalidInput(_)));

    let err = service
        .update(created.id, &input("dupont", " \t", None))
        .unwrap_err();
    assert!(matches!(err, PersonneServiceError::InvalidInput(_)));
}

#[test]
fn update_rejects_future_birth_date_but_not_young_age() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let created = service.create(&input("dupont", "marie", None)).unwrap();

    let mut future = input("dupont", "marie", None);
    future.date_naissance = Some(date(2025, 1, 1));
    let err = service.update(created.id, &future).unwrap_err();
    assert!(matches!(err, PersonneServiceError::InvalidBirthDate(_)));

    let mut infant = input("dupont", "marie", None);
    infant.date_naissance = Some(date(2024, 3, 1));
    let updated = service.update(created.id, &infant).unwrap();
    assert_eq!(updated.date_naissance, Some(date(2024, 3, 1)));
}

#[test]
fn update_rejects_phone_of_another_record() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    service
        .create(&input("dupont", "marie", Some("0612345678")))
        .unwrap();
    let other = service
        .create(&input("durand", "paul", Some("0700000000")))
        .unwrap();

    let err = service
        .update(other.id, &input("durand", "paul", Some("06 12 34 56 78")))
        .unwrap_err();
    assert!(matches!(err, PersonneServiceError::DuplicatePhone(_)));
}

#[test]
fn update_keeping_own_phone_is_not_a_duplicate() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let created = service
        .create(&input("dupont", "marie", Some("0612345678")))
        .unwrap();

    let mut changed = input("  dupont-durand ", "mARIE", Some("06 12 34 56 78"));
    changed.adresse = Some(" 5 avenue Foch ".to_string());
    let updated = service.update(created.id, &changed).unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.nom, "DUPONT-DURAND");
    assert_eq!(updated.prenom, "Marie");
    assert_eq!(updated.telephone.as_deref(), Some("0612345678"));
    assert_eq!(updated.adresse.as_deref(), Some("5 avenue Foch"));
    assert_eq!(service.find_by_id(created.id).unwrap(), updated);
}

#[test]
fn update_replaces_optional_fields_fully() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let mut full = input("dupont", "marie", Some("0612345678"));
    full.adresse = Some("1 rue de Paris".to_string());
    full.date_naissance = Some(date(1990, 1, 1));
    let created = service.create(&full).unwrap();

    let updated = service
        .update(created.id, &input("dupont", "marie", None))
        .unwrap();
    assert_eq!(updated.telephone, None);
    assert_eq!(updated.adresse, None);
    assert_eq!(updated.date_naissance, None);
}

#[test]
fn delete_removes_record() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let created = service.create(&input("dupont", "marie", None)).unwrap();

    service.delete(created.id).unwrap();
    assert!(service.find_all().unwrap().is_empty());
}

#[test]
fn search_by_nom_fragment_ignores_case() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    service.create(&input("dupont", "marie", None)).unwrap();
    service.create(&input("Dupuis", "jean", None)).unwrap();
    service.create(&input("martin", "paul", None)).unwrap();
    service.create(&input("leDUPre", "anne", None)).unwrap();

    let found: Vec<_> = service
        .search(&PersonneSearch {
            nom: Some("Dup".to_string()),
            ..PersonneSearch::default()
        })
        .unwrap()
        .into_iter()
        .map(|p| p.nom)
        .collect();
    assert_eq!(found, vec!["DUPONT", "DUPUIS", "LEDUPRE"]);
}

#[test]
fn search_finds_accented_names_as_typed() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let created = service.create(&input("dupré", "élodie", None)).unwrap();
    assert_eq!(created.nom, "DUPRÉ");
    assert_eq!(created.prenom, "Élodie");
    service.create(&input("dupont", "marie", None)).unwrap();

    for (nom, prenom) in [
        (Some("dupré"), None),
        (Some("Dupré"), None),
        (None, Some("élodie")),
        (None, Some("ÉLODIE")),
        (Some("pRÉ"), Some("éLo")),
    ] {
        let found = service
            .search(&PersonneSearch {
                nom: nom.map(str::to_string),
                prenom: prenom.map(str::to_string),
                telephone: None,
            })
            .unwrap();
        assert_eq!(found, vec![created.clone()], "nom={nom:?} prenom={prenom:?}");
    }
}

#[test]
fn find_all_lists_in_id_order() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    service.create(&input("b", "b", None)).unwrap();
    service.create(&input("a", "a", None)).unwrap();

    let ids: Vec<_> = service.find_all().unwrap().iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![1, 2]);
}

#[test]
fn reset_table_restarts_identifiers() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    service.create(&input("dupont", "marie", None)).unwrap();
    service.create(&input("durand", "paul", None)).unwrap();

    service.reset_table().unwrap();
    assert!(service.find_all().unwrap().is_empty());

    let next = service.create(&input("martin", "paul", None)).unwrap();
    assert_eq!(next.id, 1);
}
