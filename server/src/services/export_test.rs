use records::SimNao;
use time::macros::datetime;

use super::*;

fn sample() -> Record {
    Record {
        id: 1,
        posto: "Marília".into(),
        data: "2024-01-10".into(),
        mesa_sim_nao: SimNao::Sim,
        numero_mesa: Some("12".into()),
        coleta_imagem: SimNao::Sim,
        retaguarda_sim_nao: SimNao::Sim,
        retaguarda_destino: Some("Poupatempo".into()),
        hora_inicio: "08:15".into(),
        hora_termino: None,
        procedimento: "Atendimento\ncom várias linhas".into(),
        ..Record::default()
    }
}

#[test]
fn filename_uses_timestamp() {
    let now = datetime!(2024-03-05 07:08:09 UTC);
    assert_eq!(export_filename(now).unwrap(), "Registros_PPT_20240305_070809.xlsx");
}

#[test]
fn display_date_reorders_iso() {
    assert_eq!(display_date("2024-01-10"), "10/01/2024");
    assert_eq!(display_date("ontem"), "ontem");
    assert_eq!(display_date("2023-02-29"), "2023-02-29");
}

#[test]
fn cells_follow_header_order() {
    let cells = record_cells(&sample());
    assert_eq!(cells.len(), HEADERS.len());
    assert_eq!(cells[0], "Marília");
    assert_eq!(cells[1], "10/01/2024");
    assert_eq!(cells[3], "");
    assert_eq!(cells[4], "12");
    assert_eq!(cells[5], "SIM");
    assert_eq!(cells[7], "Poupatempo");
    assert_eq!(cells[8], "Atendimento\ncom várias linhas");
}

#[test]
fn routing_nao_leaves_destination_blank() {
    let record = Record {
        retaguarda_sim_nao: SimNao::Nao,
        retaguarda_destino: Some("COREN".into()),
        ..sample()
    };
    let cells = record_cells(&record);
    assert_eq!(cells[6], "NÃO");
    assert_eq!(cells[7], "");
}

#[test]
fn internal_sector_fills_destination_column() {
    let record = Record { retaguarda_destino: None, retaguarda_setor: Some("Protocolo".into()), ..sample() };
    assert_eq!(record_cells(&record)[7], "Protocolo");
}

#[test]
fn workbook_is_a_zip_container() {
    let bytes = build_workbook(&[sample(), Record { id: 2, ..sample() }]).unwrap();
    assert!(bytes.starts_with(b"PK"));
}

#[test]
fn empty_export_still_builds() {
    let bytes = build_workbook(&[]).unwrap();
    assert!(bytes.starts_with(b"PK"));
}
