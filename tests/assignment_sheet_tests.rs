use faculty_tools::{AssignmentSheet, ContractType, CourseHours, CourseHoursTable, FasRow};

const PASTE: &str = "\
ENGL-1190-H1602 Composition I
Lecture 1/12/2026 - 5/8/2026
M/W 9:00 - 10:15 AM SOU-B, 204
ENGL-2740-W0001 Film and Literature
1/12/2026 - 3/6/2026 Online via Zoom
TTH 1:00 - 2:15 PM
";

fn sheet(contract: ContractType) -> AssignmentSheet {
    let mut hours = CourseHoursTable::default();
    hours.insert("2740", CourseHours::new(3, 3, 3));
    AssignmentSheet::from_text(PASTE, contract, &hours).unwrap()
}

#[test]
fn pasted_schedule_becomes_one_row_per_course() {
    let sheet = sheet(ContractType::Base);
    assert_eq!(sheet.len(), 2);

    let first = sheet.row(0).unwrap();
    assert_eq!(first.course, "ENGL 1190 H1602");
    assert_eq!(
        (first.credit_hours.as_str(), first.contact_hours.as_str(), first.equivalency_hours.as_str()),
        ("4", "4", "5")
    );
    assert_eq!(first.contract_type, "BASE");
    assert_eq!(first.begin_date, "1/12/2026");
    assert_eq!(first.end_date, "5/8/2026");
    assert_eq!(first.day_times[0], "9:00 - 10:15 AM");
    assert_eq!(first.day_times[1], "");
    assert_eq!(first.day_times[2], "9:00 - 10:15 AM");
    assert_eq!(first.room, "SB-204");
    assert_eq!(first.online, "");

    let second = sheet.row(1).unwrap();
    assert_eq!(second.room, "Remote");
    assert_eq!(second.online, "Yes");
    assert_eq!(second.day_times[1], "1:00 - 2:15 PM");
    assert_eq!(second.day_times[3], "1:00 - 2:15 PM");
    assert_eq!(second.end_date, "3/6/2026");
}

#[test]
fn contract_type_is_applied_to_every_row() {
    let sheet = sheet(ContractType::Xxc);
    assert!(sheet.rows().unwrap().iter().all(|row| row.contract_type == "XXC"));
    assert_eq!("ec".parse::<ContractType>().unwrap(), ContractType::Ec);
    assert!("overload".parse::<ContractType>().is_err());
}

#[test]
fn text_without_course_codes_gives_empty_sheet() {
    let sheet = AssignmentSheet::from_text("nothing here", ContractType::Base, &CourseHoursTable::default()).unwrap();
    assert!(sheet.is_empty());
    assert_eq!(sheet.to_tsv().unwrap(), "");
}

#[test]
fn editing_cells_and_rows() {
    let mut sheet = sheet(ContractType::Base);
    sheet.set_cell(0, "combined", "ENGL 1190 H1603").unwrap();
    sheet.set_cell(1, "ROOM", "LA-310").unwrap();
    assert_eq!(sheet.row(0).unwrap().combined_with, "ENGL 1190 H1603");
    assert_eq!(sheet.row(1).unwrap().room, "LA-310");

    assert!(sheet.set_cell(0, "bogus", "x").is_err());
    assert!(sheet.set_cell(5, "room", "x").is_err());

    sheet.push_row(&FasRow::default()).unwrap();
    assert_eq!(sheet.len(), 3);
    assert!(sheet.delete_row(0).unwrap());
    assert!(!sheet.delete_row(7).unwrap());
    assert_eq!(sheet.len(), 2);
    assert_eq!(sheet.row(0).unwrap().course, "ENGL 2740 W0001");
}

#[test]
fn tsv_has_sixteen_columns_and_no_header() {
    let tsv = sheet(ContractType::Ec).to_tsv().unwrap();
    let lines: Vec<&str> = tsv.lines().collect();
    assert_eq!(lines.len(), 2);
    for line in &lines {
        assert_eq!(line.split('\t').count(), 16);
    }
    assert!(lines[0].starts_with("ENGL 1190 H1602\t4\t4\t5\tEC\t"));
    assert!(!tsv.contains("Course Code"));
}

#[test]
fn table_view_shows_headers() {
    let table = sheet(ContractType::Base).render_table();
    assert!(table.contains("Course Code /Section"));
    assert!(table.contains("SB-204"));
}

#[test]
fn building_letter_does_not_fill_a_day_column() {
    let paste = "ENGL-2010-H1001 Intermediate Writing\n1/12/2026 - 5/8/2026\nT/TH 1:00 - 2:15 PM SOU-F, 110\n";
    let sheet = AssignmentSheet::from_text(paste, ContractType::Base, &CourseHoursTable::default()).unwrap();
    let row = sheet.row(0).unwrap();
    assert_eq!(row.room, "SF-110");
    let filled: Vec<usize> = (0..6).filter(|&i| !row.day_times[i].is_empty()).collect();
    assert_eq!(filled, vec![1, 3]);
}
