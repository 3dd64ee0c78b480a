use crate::catalog::Catalog;
use crate::errors::ServerError;
use crate::responses::{xlsx_response, ResultResp};
use rust_xlsxwriter::{Format, Workbook, Worksheet};

const HEADERS: [&str; 12] = [
    "ID",
    "Title",
    "Location",
    "Price",
    "Price (₹)",
    "BHK",
    "Area (sqft)",
    "Monthly Rent (₹)",
    "Monthly EMI (₹)",
    "Buying Cost (₹)",
    "Renting Cost (₹)",
    "Verdict",
];

fn cell_err(what: &str, e: rust_xlsxwriter::XlsxError) -> ServerError {
    ServerError::XlsxError(format!("Failed to write {what}: {e}"))
}

fn write_optional(ws: &mut Worksheet, r: u32, c: u16, v: Option<f64>) -> Result<(), ServerError> {
    match v {
        Some(v) => ws.write_number(r, c, v).map(|_| ()),
        None => ws.write_string(r, c, "").map(|_| ()),
    }
    .map_err(|e| cell_err(HEADERS[c as usize], e))
}

/// Renders the catalog, one row per record in catalog order.
fn catalog_workbook(catalog: &Catalog) -> Result<Vec<u8>, ServerError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let bold = Format::new().set_bold();
    let money = Format::new().set_num_format("#,##0");

    for (col, header) in HEADERS.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *header, &bold)
            .map_err(|e| cell_err(header, e))?;
    }

    for (i, record) in catalog.records().iter().enumerate() {
        let r = (i + 1) as u32;
        let l = &record.listing;
        let p = &record.projection;

        worksheet
            .write_number(r, 0, l.id as f64)
            .map_err(|e| cell_err("id", e))?;
        worksheet
            .write_string(r, 1, &l.title)
            .map_err(|e| cell_err("title", e))?;
        worksheet
            .write_string(r, 2, &l.location)
            .map_err(|e| cell_err("location", e))?;
        worksheet
            .write_string(r, 3, &l.price_raw)
            .map_err(|e| cell_err("price", e))?;

        let money_cols = [
            (4, l.price_value),
            (7, record.imputed_rent),
            (8, p.monthly_emi),
            (9, p.final_buying_cost),
            (10, p.final_renting_cost),
        ];
        for (col, value) in money_cols {
            worksheet
                .write_number_with_format(r, col, value, &money)
                .map_err(|e| cell_err(HEADERS[col as usize], e))?;
        }

        write_optional(worksheet, r, 5, l.bhk.map(f64::from))?;
        write_optional(worksheet, r, 6, l.area)?;

        worksheet
            .write_string(r, 11, record.decision().as_str())
            .map_err(|e| cell_err("verdict", e))?;
    }

    worksheet.autofit();

    workbook
        .save_to_buffer()
        .map_err(|e| ServerError::XlsxError(format!("Failed to save workbook: {e}")))
}

pub fn export_catalog_xlsx(catalog: &Catalog) -> ResultResp {
    let buffer = catalog_workbook(catalog)?;
    xlsx_response(buffer, "property_verdicts.xlsx")
}
