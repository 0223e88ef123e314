use guestlist::{
    Attendance, Category, Command, Error, ExportMode, Field, GuestId, GuestRecord, NewGuest,
    Outcome, Roster, group_by_table, normalize,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn guest(id: &str, table: &str, name: &str, category: Category) -> GuestRecord {
    GuestRecord {
        id: GuestId::new(id),
        table: table.to_string(),
        name: name.to_string(),
        category,
        notes: String::new(),
        attended: Attendance::No,
    }
}

// Three guests: table 5, table 2 and the unassigned table
fn wedding() -> Roster {
    Roster::from_records(vec![
        guest("A00001", "5", "ANA PÉREZ", Category::Adult),
        guest("A00002", "2", "LUIS GÓMEZ", Category::Teen),
        guest("A00003", "0", "SIN MESA", Category::Child),
    ])
}

fn names(records: &[&GuestRecord]) -> Vec<String> {
    records.iter().map(|g| g.name.clone()).collect()
}

#[test]
fn normalize_folds_case_and_accents() {
    assert_eq!(normalize("José"), "JOSE");
    assert_eq!(normalize("JOSE"), "JOSE");
    assert_eq!(normalize("josé"), normalize("JOSÉ"));
    assert_eq!(normalize("  Muñoz "), "MUNOZ");
    assert_eq!(normalize(""), "");
}

#[test]
fn normalize_is_idempotent() {
    for text in ["José", "ÁNGELES ÑANDÚ", "çà et là", "plain", " a \u{301}", "straße", ""] {
        let once = normalize(text);
        assert_eq!(normalize(&once), once, "not idempotent for {:?}", text);
    }
}

#[test]
fn normalize_drops_every_mark_category() {
    assert_eq!(normalize("कि"), "क");
    assert_eq!(normalize("Ç"), "C");
}

#[test]
fn tally_counts_tables_and_categories() {
    let tally = wedding().tally();
    assert_eq!(tally.table_count, 2);
    assert_eq!(tally.total, 3);
    assert_eq!(tally.count(&Category::Adult), 1);
    assert_eq!(tally.count(&Category::Teen), 1);
    assert_eq!(tally.count(&Category::Child), 1);
    assert_eq!(tally.count(&Category::Infant), 0);
}

#[test]
fn tally_ignores_unknown_categories_and_only_literal_zero_table() {
    let roster = Roster::from_records(vec![
        guest("B00001", "00", "UNO", Category::Unknown("VIP".to_string())),
        guest("B00002", " 0 ", "DOS", Category::Adult),
        guest("B00003", "3", "TRES", Category::Infant),
        guest("B00004", "3", "CUATRO", Category::Infant),
    ]);
    let tally = roster.tally();

    // "00" is a distinct value; " 0 " trims to "0" and is excluded
    assert_eq!(tally.table_count, 2);
    assert_eq!(tally.total, 4);
    let bucketed: usize = tally.per_category.iter().map(|(_, n)| n).sum();
    assert_eq!(bucketed, 3);
    assert!(bucketed <= tally.total);
}

#[test]
fn search_matches_without_accents() {
    let roster = wedding();
    assert_eq!(names(&roster.search("perez")), vec!["ANA PÉREZ"]);
    assert_eq!(names(&roster.search(&normalize("perez"))), vec!["ANA PÉREZ"]);
    assert_eq!(names(&roster.search("GÓM")), vec!["LUIS GÓMEZ"]);
    assert!(roster.search("zzz").is_empty());
}

#[test]
fn empty_search_returns_everything_in_order() {
    let roster = wedding();
    let all: Vec<&GuestRecord> = roster.records().iter().collect();
    assert_eq!(roster.search(""), all);
    assert_eq!(roster.search("   "), all);
}

#[test]
fn export_by_table_sorts_by_number_then_name() {
    let roster = wedding();
    assert_eq!(
        names(&roster.export_ordering(ExportMode::ByTable)),
        vec!["SIN MESA", "LUIS GÓMEZ", "ANA PÉREZ"]
    );

    let roster = Roster::from_records(vec![
        guest("C00001", "10", "BETO", Category::Adult),
        guest("C00002", "9", "ZOE", Category::Adult),
        guest("C00003", "9", "ABEL", Category::Adult),
        guest("C00004", "x", "CARLA", Category::Adult),
    ]);
    assert_eq!(
        names(&roster.export_ordering(ExportMode::ByTable)),
        vec!["CARLA", "ABEL", "ZOE", "BETO"]
    );
}

#[test]
fn export_alphabetical_is_stable_on_ties() {
    let roster = Roster::from_records(vec![
        guest("D00001", "3", "MARTA", Category::Adult),
        guest("D00002", "1", "ANA", Category::Adult),
        guest("D00003", "2", "MARTA", Category::Teen),
    ]);
    let ordered = roster.export_ordering(ExportMode::Alphabetical);
    let ids: Vec<&str> = ordered.iter().map(|g| g.id.as_str()).collect();
    assert_eq!(ids, vec!["D00002", "D00001", "D00003"]);

    let by_table = roster.export_ordering(ExportMode::ByTable);
    for pair in by_table.windows(2) {
        let a = (pair[0].table_number(), &pair[0].name);
        let b = (pair[1].table_number(), &pair[1].name);
        assert!(a <= b);
    }
}

#[test]
fn group_by_table_partitions_in_ascending_order() {
    let roster = Roster::from_records(vec![
        guest("E00001", "3", "A", Category::Adult),
        guest("E00002", "1", "B", Category::Adult),
        guest("E00003", "3", "C", Category::Adult),
        guest("E00004", "abc", "D", Category::Adult),
        guest("E00005", "0", "E", Category::Adult),
    ]);
    let groups = group_by_table(roster.records());

    let tables: Vec<u32> = groups.iter().map(|g| g.table).collect();
    assert_eq!(tables, vec![0, 1, 3]);

    let sizes: usize = groups.iter().map(|g| g.guests.len()).sum();
    assert_eq!(sizes, roster.len());

    // Within a table, roster order is kept
    let table3: Vec<&str> = groups[2].guests.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(table3, vec!["A", "C"]);
    let table0: Vec<&str> = groups[0].guests.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(table0, vec!["D", "E"]);
}

#[test]
fn add_guest_normalizes_fields() {
    let mut roster = wedding();
    let id = roster
        .add_guest(NewGuest {
            table: "07".to_string(),
            name: "ana lopez".to_string(),
            category: Category::Adult,
            notes: "vip".to_string(),
        })
        .unwrap();

    let added = roster.get(&id).unwrap();
    assert_eq!(added.table, "7");
    assert_eq!(added.name, "ANA LOPEZ");
    assert_eq!(added.notes, "VIP");
    assert_eq!(added.category, Category::Adult);
    assert_eq!(added.attended, Attendance::No);
    assert_eq!(id.as_str().len(), 6);
    assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    assert_eq!(roster.len(), 4);
    assert_eq!(roster.records().last().unwrap().id, id);
}

#[test]
fn add_guest_rejects_blank_name() {
    let mut roster = wedding();
    let err = roster
        .add_guest(NewGuest {
            table: "1".to_string(),
            name: "   ".to_string(),
            ..NewGuest::default()
        })
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(roster, wedding());
}

#[test]
fn add_guest_never_reuses_an_id() {
    let mut roster = Roster::new();
    let mut rng = StdRng::seed_from_u64(7);
    for i in 0..500 {
        roster
            .add_guest_with_rng(
                NewGuest {
                    table: (i % 20).to_string(),
                    name: format!("guest {}", i),
                    ..NewGuest::default()
                },
                &mut rng,
            )
            .unwrap();
    }
    let mut ids: Vec<&str> = roster.records().iter().map(|g| g.id.as_str()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 500);
}

#[test]
fn add_then_delete_restores_roster() {
    let mut roster = wedding();
    let id = roster
        .add_guest(NewGuest {
            table: "4".to_string(),
            name: "temporal".to_string(),
            ..NewGuest::default()
        })
        .unwrap();
    assert!(roster.delete_guest(&id).is_some());
    assert_eq!(roster, wedding());
}

#[test]
fn update_field_uppercases_names_only() {
    let mut roster = wedding();
    let id = GuestId::new("A00001");

    assert!(roster.update_field(&id, Field::Name, "ana maría pérez"));
    assert!(roster.update_field(&id, Field::Notes, "sin gluten"));
    assert!(roster.update_field(&id, Field::Table, "08"));
    assert!(roster.update_field(&id, Field::Category, "BEBÉ"));
    assert!(roster.update_field(&id, Field::Attended, "SI"));

    let g = roster.get(&id).unwrap();
    assert_eq!(g.name, "ANA MARÍA PÉREZ");
    assert_eq!(g.notes, "sin gluten");
    assert_eq!(g.table, "08");
    assert_eq!(g.category, Category::Infant);
    assert_eq!(g.attended, Attendance::Yes);
}

#[test]
fn update_of_missing_guest_is_a_no_op() {
    let mut roster = wedding();
    assert!(!roster.update_field(&GuestId::new("ZZZZZZ"), Field::Name, "X"));
    assert_eq!(roster, wedding());

    assert!(roster.delete_guest(&GuestId::new("ZZZZZZ")).is_none());
    assert_eq!(roster, wedding());
}

#[test]
fn commands_report_whether_to_save() {
    let mut roster = wedding();

    let added = Command::AddGuest(NewGuest {
        table: "1".to_string(),
        name: "nuevo".to_string(),
        ..NewGuest::default()
    })
    .apply(&mut roster)
    .unwrap();
    let Outcome::Added(id) = added.clone() else {
        panic!("expected an added guest, got {:?}", added);
    };
    assert!(added.needs_save());

    let edited = Command::SetField {
        id: id.clone(),
        field: Field::Notes,
        value: "mesa dulce".to_string(),
    }
    .apply(&mut roster)
    .unwrap();
    assert_eq!(edited, Outcome::Updated);
    assert!(!edited.needs_save());

    let stale = Command::SetField {
        id: GuestId::new("ZZZZZZ"),
        field: Field::Name,
        value: "x".to_string(),
    }
    .apply(&mut roster)
    .unwrap();
    assert_eq!(stale, Outcome::Unchanged);

    let deleted = Command::DeleteGuest { id: id.clone() }.apply(&mut roster).unwrap();
    assert!(matches!(deleted, Outcome::Deleted(ref g) if g.id == id));
    assert!(deleted.needs_save());

    let again = Command::DeleteGuest { id }.apply(&mut roster).unwrap();
    assert_eq!(again, Outcome::Unchanged);
    assert_eq!(roster, wedding());
}

#[test]
fn category_labels_round_trip() {
    for category in Category::KNOWN {
        assert_eq!(Category::from_label(category.label()), category);
    }
    for raw in ["bebe", "mayor", "ADULT", " MENOR"] {
        assert_eq!(Category::from_label(raw), Category::Unknown(raw.to_string()));
    }
    assert_eq!(
        Category::from_label("Abuelo"),
        Category::Unknown("Abuelo".to_string())
    );
    assert_eq!(Category::Teen.short_label(), "ADOL.");
}

#[test]
fn export_mode_from_query() {
    assert_eq!(ExportMode::from_query("table"), Some(ExportMode::ByTable));
    assert_eq!(ExportMode::from_query("alpha"), Some(ExportMode::Alphabetical));
    assert_eq!(ExportMode::from_query("alfabético"), Some(ExportMode::Alphabetical));
    assert_eq!(ExportMode::from_query("random"), None);
}
