//! SdI business rules for ordinary invoices (FPA12 / FPR12).
//!
//! Every rule walks each `FatturaElettronicaBody` and each repeated group
//! beneath it. A rule failing on several groups keeps only the message of
//! the last one in the report map; [`ValidationReport::violations`] lists
//! them all.
//!
//! Amounts are compared as [`Decimal`]; a missing or non-numeric amount
//! counts as zero.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use super::codes;
use crate::core::{
    DocumentValidator, EfattureError, StructuralSchema, ValidationReport, XmlDocument,
};

/// Largest serialized invoice the SdI accepts (5 MiB).
pub const MAX_INVOICE_SIZE: usize = 5 * 1024 * 1024;

/// Above this many schema violations the SdI reports `00201` instead of `00200`.
pub const MAX_FORMAT_ERRORS: usize = 50;

const TRANSMISSION: &str = "FatturaElettronicaHeader/DatiTrasmissione";
const DOCUMENT: &str = "DatiGenerali/DatiGeneraliDocumento";

/// Cross-field checks of the `004xx` family, preceded by the size (`00003`)
/// and, when a schema is configured, format (`00200` / `00201`) checks.
/// Those two stop evaluation: a document failing them gets no other errors.
#[derive(Debug, Clone, Default)]
pub struct BusinessRuleValidator {
    schema: Option<Arc<StructuralSchema>>,
}

impl BusinessRuleValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check the document against `schema` before the business rules.
    pub fn with_schema(mut self, schema: Arc<StructuralSchema>) -> Self {
        self.schema = Some(schema);
        self
    }
}

impl DocumentValidator for BusinessRuleValidator {
    fn name(&self) -> &'static str {
        "business-rules"
    }

    fn errors(&self, document: &XmlDocument) -> Result<ValidationReport, EfattureError> {
        let mut report = ValidationReport::new();

        let size = document.to_xml_string(false)?.len();
        if size > MAX_INVOICE_SIZE {
            report.insert(
                codes::SIZE_EXCEEDED,
                format!("Le dimensioni del file superano quelle ammesse ({size} byte)"),
            );
            return Ok(report);
        }

        if let Some(schema) = &self.schema {
            let violations = schema.violations(document.root());
            if let Some(first) = violations.first() {
                if violations.len() > MAX_FORMAT_ERRORS {
                    report.insert(
                        codes::TOO_MANY_FORMAT_ERRORS,
                        format!("Riscontrati più di 50 errori di formato ({})", first.message),
                    );
                } else {
                    report.insert(
                        codes::FORMAT_NONCONFORMING,
                        format!(
                            "File non conforme al formato ({}, percorso: {})",
                            first.message, first.path
                        ),
                    );
                }
                return Ok(report);
            }
        }

        let f = Fields { doc: document };
        line_natura(&f, &mut report)?;
        withholding(&f, &mut report)?;
        fund_natura(&f, &mut report)?;
        buyer_identity(&f, &mut report)?;
        linked_invoice_dates(&f, &mut report)?;
        summary_coverage(&f, &mut report)?;
        reverse_charge(&f, &mut report)?;
        summary_tax(&f, &mut report)?;
        summary_taxable(&f, &mut report)?;
        line_totals(&f, &mut report)?;
        rates_as_percentage(&f, &mut report)?;
        document_numbers(&f, &mut report)?;
        recipient_code(&f, &mut report)?;
        format_version(&f, &mut report)?;
        summary_natura(&f, &mut report)?;
        discounts(&f, &mut report)?;
        Ok(report)
    }
}

struct Fields<'a> {
    doc: &'a XmlDocument,
}

impl Fields<'_> {
    fn text(&self, path: &str) -> Result<Option<String>, EfattureError> {
        self.doc.get(path)
    }

    fn amount(&self, path: &str) -> Result<Option<Decimal>, EfattureError> {
        Ok(self.text(path)?.as_deref().and_then(parse_amount))
    }

    fn amount_or_zero(&self, path: &str) -> Result<Decimal, EfattureError> {
        Ok(self.amount(path)?.unwrap_or_default())
    }

    fn count(&self, path: &str) -> Result<usize, EfattureError> {
        self.doc.count(path)
    }

    fn bodies(&self) -> Result<usize, EfattureError> {
        self.count("FatturaElettronicaBody")
    }
}

fn parse_amount(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw.trim()).ok()
}

fn body(i: usize) -> String {
    format!("FatturaElettronicaBody[{i}]")
}

fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

// 00400 / 00401
fn line_natura(f: &Fields<'_>, report: &mut ValidationReport) -> Result<(), EfattureError> {
    for i in 1..=f.bodies()? {
        let lines = format!("{}/DatiBeniServizi/DettaglioLinee", body(i));
        for j in 1..=f.count(&lines)? {
            let rate = f.amount_or_zero(&format!("{lines}[{j}]/AliquotaIVA"))?;
            let natura = f.text(&format!("{lines}[{j}]/Natura"))?;
            match (rate.is_zero(), natura) {
                (true, None) => report.insert(
                    codes::NATURA_MISSING_AT_ZERO_RATE,
                    format!(
                        "2.2.1.14 <Natura> non presente a fronte di 2.2.1.12 <AliquotaIVA> {rate} pari a zero (linea {j})"
                    ),
                ),
                (false, Some(natura)) => report.insert(
                    codes::NATURA_AT_NONZERO_RATE,
                    format!(
                        "2.2.1.14 <Natura> {natura} presente a fronte di 2.2.1.12 <AliquotaIVA> {rate} diversa da zero (linea {j})"
                    ),
                ),
                _ => {}
            }
        }
    }
    Ok(())
}

// 00411 / 00415
fn withholding(f: &Fields<'_>, report: &mut ValidationReport) -> Result<(), EfattureError> {
    for i in 1..=f.bodies()? {
        let doc = format!("{}/{DOCUMENT}", body(i));
        if f.count(&format!("{doc}/DatiRitenuta"))? > 0 {
            continue;
        }

        let lines = format!("{}/DatiBeniServizi/DettaglioLinee", body(i));
        for j in 1..=f.count(&lines)? {
            if f.text(&format!("{lines}[{j}]/Ritenuta"))?.as_deref() == Some("SI") {
                report.insert(
                    codes::WITHHOLDING_DATA_MISSING,
                    format!(
                        "2.1.1.5 <DatiRitenuta> non presente a fronte di almeno un blocco 2.2.1 <DettaglioLinee> con 2.2.1.13 <Ritenuta> uguale a SI (linea {j})"
                    ),
                );
            }
        }

        let funds = format!("{doc}/DatiCassaPrevidenziale");
        for j in 1..=f.count(&funds)? {
            if f.text(&format!("{funds}[{j}]/Ritenuta"))?.as_deref() == Some("SI") {
                report.insert(
                    codes::FUND_WITHHOLDING_DATA_MISSING,
                    "2.1.1.5 <DatiRitenuta> non presente a fronte di 2.1.1.7.6 <Ritenuta> uguale a SI",
                );
            }
        }
    }
    Ok(())
}

// 00413 / 00414
fn fund_natura(f: &Fields<'_>, report: &mut ValidationReport) -> Result<(), EfattureError> {
    for i in 1..=f.bodies()? {
        let funds = format!("{}/{DOCUMENT}/DatiCassaPrevidenziale", body(i));
        for j in 1..=f.count(&funds)? {
            let rate = f.amount_or_zero(&format!("{funds}[{j}]/AliquotaIVA"))?;
            let natura = f.text(&format!("{funds}[{j}]/Natura"))?;
            match (rate.is_zero(), natura) {
                (true, None) => report.insert(
                    codes::FUND_NATURA_MISSING_AT_ZERO_RATE,
                    "2.1.1.7.7 <Natura> non presente a fronte di 2.1.1.7.5 <AliquotaIVA> pari a zero",
                ),
                (false, Some(natura)) => report.insert(
                    codes::FUND_NATURA_AT_NONZERO_RATE,
                    format!(
                        "2.1.1.7.7 <Natura> {natura} presente a fronte di 2.1.1.7.5 <AliquotaIVA> {rate} diversa da zero"
                    ),
                ),
                _ => {}
            }
        }
    }
    Ok(())
}

// 00417
fn buyer_identity(f: &Fields<'_>, report: &mut ValidationReport) -> Result<(), EfattureError> {
    let buyer = "FatturaElettronicaHeader/CessionarioCommittente/DatiAnagrafici";
    let vat = f.doc.has(&format!("{buyer}/IdFiscaleIVA"))?;
    let tax_code = f.doc.has(&format!("{buyer}/CodiceFiscale"))?;
    if !vat && !tax_code {
        report.insert(
            codes::BUYER_TAX_ID_MISSING,
            "1.4.1.1 <IdFiscaleIVA> e 1.4.1.2 <CodiceFiscale> non valorizzati",
        );
    }
    Ok(())
}

// 00418
fn linked_invoice_dates(f: &Fields<'_>, report: &mut ValidationReport) -> Result<(), EfattureError> {
    let date = |raw: Option<String>| {
        raw.and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok())
    };
    for i in 1..=f.bodies()? {
        let Some(issued) = date(f.text(&format!("{}/{DOCUMENT}/Data", body(i)))?) else {
            continue;
        };
        let linked = format!("{}/DatiGenerali/DatiFattureCollegate", body(i));
        for j in 1..=f.count(&linked)? {
            let Some(linked_date) = date(f.text(&format!("{linked}[{j}]/Data"))?) else {
                continue;
            };
            if issued < linked_date {
                report.insert(
                    codes::DATE_BEFORE_LINKED_INVOICE,
                    format!("2.1.1.3 <Data> {issued} antecedente a 2.1.6.3 <Data> {linked_date}"),
                );
            }
        }
    }
    Ok(())
}

// 00419
fn summary_coverage(f: &Fields<'_>, report: &mut ValidationReport) -> Result<(), EfattureError> {
    for i in 1..=f.bodies()? {
        let summaries = format!("{}/DatiBeniServizi/DatiRiepilogo", body(i));
        let mut covered = HashSet::new();
        for j in 1..=f.count(&summaries)? {
            let rate = f.amount_or_zero(&format!("{summaries}[{j}]/AliquotaIVA"))?;
            if !rate.is_zero() {
                covered.insert(rate.normalize());
            }
        }

        let funds = format!("{}/{DOCUMENT}/DatiCassaPrevidenziale", body(i));
        for j in 1..=f.count(&funds)? {
            let rate = f.amount_or_zero(&format!("{funds}[{j}]/AliquotaIVA"))?;
            if !rate.is_zero() && !covered.contains(&rate.normalize()) {
                report.insert(
                    codes::SUMMARY_MISSING_FOR_RATE,
                    format!(
                        "2.2.2 <DatiRiepilogo> non presente in corrispondenza di 2.1.1.7.5 <AliquotaIVA> {rate} (per ogni aliquota IVA presente in fattura deve esistere il corrispondente blocco di <DatiRiepilogo>)"
                    ),
                );
                break;
            }
        }

        let lines = format!("{}/DatiBeniServizi/DettaglioLinee", body(i));
        for j in 1..=f.count(&lines)? {
            let rate = f.amount_or_zero(&format!("{lines}[{j}]/AliquotaIVA"))?;
            if !rate.is_zero() && !covered.contains(&rate.normalize()) {
                report.insert(
                    codes::SUMMARY_MISSING_FOR_RATE,
                    format!(
                        "2.2.2 <DatiRiepilogo> non presente in corrispondenza di 2.2.1.12 <AliquotaIVA> {rate} (per ogni aliquota IVA presente in fattura deve esistere il corrispondente blocco di <DatiRiepilogo>)"
                    ),
                );
                break;
            }
        }
    }
    Ok(())
}

// 00420
fn reverse_charge(f: &Fields<'_>, report: &mut ValidationReport) -> Result<(), EfattureError> {
    for i in 1..=f.bodies()? {
        let summaries = format!("{}/DatiBeniServizi/DatiRiepilogo", body(i));
        for j in 1..=f.count(&summaries)? {
            let natura = f.text(&format!("{summaries}[{j}]/Natura"))?;
            let chargeability = f.text(&format!("{summaries}[{j}]/EsigibilitaIVA"))?;
            if natura.as_deref().is_some_and(|n| n.starts_with("N6"))
                && chargeability.as_deref() == Some("S")
            {
                report.insert(
                    codes::REVERSE_CHARGE_WITH_SPLIT_PAYMENT,
                    "2.2.2.2 <Natura> con valore N6 (inversione contabile) a fronte di 2.2.2.7 <EsigibilitaIVA> uguale a S (scissione pagamenti) (il regime di scissione pagamenti non è compatibile con quello di inversione contabile - reverse charge)",
                );
            }
        }
    }
    Ok(())
}

// 00421
fn summary_tax(f: &Fields<'_>, report: &mut ValidationReport) -> Result<(), EfattureError> {
    for i in 1..=f.bodies()? {
        let summaries = format!("{}/DatiBeniServizi/DatiRiepilogo", body(i));
        for j in 1..=f.count(&summaries)? {
            let rate = f.amount_or_zero(&format!("{summaries}[{j}]/AliquotaIVA"))?;
            let taxable = f.amount_or_zero(&format!("{summaries}[{j}]/ImponibileImporto"))?;
            let tax = f.amount_or_zero(&format!("{summaries}[{j}]/Imposta"))?;

            let expected = round_cents(rate * taxable / dec!(100));
            if (expected - tax).abs() > dec!(0.01) {
                report.insert(
                    codes::TAX_MISCALCULATED,
                    format!(
                        "2.2.2.6 <Imposta> [{tax}] non calcolato secondo le regole definite nelle specifiche tecniche (( AliquotaIVA * ImponibileImporto ) / 100 = ( {rate} * {taxable} ) / 100 = {expected:.2}; è ammessa la tolleranza di ±1 centesimo di euro)"
                    ),
                );
            }
        }
    }
    Ok(())
}

// 00422
fn summary_taxable(f: &Fields<'_>, report: &mut ValidationReport) -> Result<(), EfattureError> {
    for i in 1..=f.bodies()? {
        let summaries = format!("{}/DatiBeniServizi/DatiRiepilogo", body(i));
        let lines = format!("{}/DatiBeniServizi/DettaglioLinee", body(i));
        let funds = format!("{}/{DOCUMENT}/DatiCassaPrevidenziale", body(i));
        let summary_count = f.count(&summaries)?;
        let line_count = f.count(&lines)?;
        let fund_count = f.count(&funds)?;

        for j in 1..=summary_count {
            let rate = f.amount_or_zero(&format!("{summaries}[{j}]/AliquotaIVA"))?;

            let mut declared = Decimal::ZERO;
            let mut rounding = Decimal::ZERO;
            for k in 1..=summary_count {
                if f.amount_or_zero(&format!("{summaries}[{k}]/AliquotaIVA"))? != rate {
                    continue;
                }
                declared += f.amount_or_zero(&format!("{summaries}[{k}]/ImponibileImporto"))?;
                rounding += f.amount_or_zero(&format!("{summaries}[{k}]/Arrotondamento"))?;
            }

            let mut lines_total = Decimal::ZERO;
            for k in 1..=line_count {
                if f.amount_or_zero(&format!("{lines}[{k}]/AliquotaIVA"))? == rate {
                    lines_total += f.amount_or_zero(&format!("{lines}[{k}]/PrezzoTotale"))?;
                }
            }

            let mut fund_total = Decimal::ZERO;
            for k in 1..=fund_count {
                if f.amount_or_zero(&format!("{funds}[{k}]/AliquotaIVA"))? == rate {
                    fund_total +=
                        f.amount_or_zero(&format!("{funds}[{k}]/ImportoContributoCassa"))?;
                }
            }

            let expected = round_cents(lines_total + fund_total + rounding);
            if (expected - declared).abs() > Decimal::ONE {
                report.insert(
                    codes::TAXABLE_MISCALCULATED,
                    format!(
                        "2.2.2.5 <ImponibileImporto> non calcolato secondo le regole definite nelle specifiche tecniche (aliquota {rate}: atteso {expected}, dichiarato {declared})"
                    ),
                );
            }
        }
    }
    Ok(())
}

// 00423
fn line_totals(f: &Fields<'_>, report: &mut ValidationReport) -> Result<(), EfattureError> {
    for i in 1..=f.bodies()? {
        let lines = format!("{}/DatiBeniServizi/DettaglioLinee", body(i));
        for j in 1..=f.count(&lines)? {
            let line = format!("{lines}[{j}]");
            let declared = f.amount_or_zero(&format!("{line}/PrezzoTotale"))?;
            let mut unit = f.amount_or_zero(&format!("{line}/PrezzoUnitario"))?;

            let adjustments = format!("{line}/ScontoMaggiorazione");
            for k in 1..=f.count(&adjustments)? {
                let discount = f.text(&format!("{adjustments}[{k}]/Tipo"))?.as_deref() == Some("SC");
                let delta = match f.amount(&format!("{adjustments}[{k}]/Importo"))? {
                    Some(amount) => amount,
                    None => {
                        let pct = f.amount_or_zero(&format!("{adjustments}[{k}]/Percentuale"))?;
                        unit * pct / dec!(100)
                    }
                };
                if discount {
                    unit -= delta;
                } else {
                    unit += delta;
                }
            }

            let quantity = f
                .amount(&format!("{line}/Quantita"))?
                .unwrap_or(Decimal::ONE);
            let expected = unit * quantity;
            if (expected - declared).abs() > dec!(0.01) {
                report.insert(
                    codes::LINE_TOTAL_MISCALCULATED,
                    format!(
                        "2.2.1.11 <PrezzoTotale> non calcolato secondo le regole definite nelle specifiche tecniche (linea {j}, atteso: {} dichiarato: {declared}).",
                        expected.normalize()
                    ),
                );
            }
        }
    }
    Ok(())
}

// 00424
fn rates_as_percentage(f: &Fields<'_>, report: &mut ValidationReport) -> Result<(), EfattureError> {
    let mut check = |element: &str, rate: Option<Decimal>| {
        if let Some(rate) = rate.filter(|r| *r > Decimal::ZERO && *r < Decimal::ONE) {
            report.insert(
                codes::RATE_NOT_PERCENTAGE,
                format!("{element} <AliquotaIVA> {rate} non indicata in termini percentuali"),
            );
        }
    };
    for i in 1..=f.bodies()? {
        let lines = format!("{}/DatiBeniServizi/DettaglioLinee", body(i));
        for j in 1..=f.count(&lines)? {
            check("2.2.1.12", f.amount(&format!("{lines}[{j}]/AliquotaIVA"))?);
        }
        let summaries = format!("{}/DatiBeniServizi/DatiRiepilogo", body(i));
        for j in 1..=f.count(&summaries)? {
            check("2.2.2.1", f.amount(&format!("{summaries}[{j}]/AliquotaIVA"))?);
        }
        let funds = format!("{}/{DOCUMENT}/DatiCassaPrevidenziale", body(i));
        for j in 1..=f.count(&funds)? {
            check("2.1.1.7.5", f.amount(&format!("{funds}[{j}]/AliquotaIVA"))?);
        }
    }
    Ok(())
}

// 00425
fn document_numbers(f: &Fields<'_>, report: &mut ValidationReport) -> Result<(), EfattureError> {
    for i in 1..=f.bodies()? {
        let number = f.text(&format!("{}/{DOCUMENT}/Numero", body(i)))?.unwrap_or_default();
        if !number.chars().any(|c| c.is_ascii_digit()) {
            report.insert(
                codes::NUMBER_WITHOUT_DIGITS,
                format!(
                    "2.1.1.4 <Numero> '{number}' non contenente caratteri numerici (il numero della fattura deve contenere almeno un carattere numerico)"
                ),
            );
        }
    }
    Ok(())
}

// 00427
fn recipient_code(f: &Fields<'_>, report: &mut ValidationReport) -> Result<(), EfattureError> {
    let format = f
        .text(&format!("{TRANSMISSION}/FormatoTrasmissione"))?
        .map(|s| s.to_ascii_uppercase());
    let Some(code) = f.text(&format!("{TRANSMISSION}/CodiceDestinatario"))? else {
        return Ok(());
    };
    let len = code.chars().count();
    let flagged = match format.as_deref() {
        Some("FPR12") => len == 7,
        Some("FPA12") => len == 6,
        _ => false,
    };
    if let (true, Some(format)) = (flagged, format) {
        report.insert(
            codes::RECIPIENT_CODE_LENGTH,
            format!(
                "1.1.4 <CodiceDestinatario> di {len} caratteri a fronte di 1.1.3 <FormatoTrasmissione> con valore {format}"
            ),
        );
    }
    Ok(())
}

// 00428
fn format_version(f: &Fields<'_>, report: &mut ValidationReport) -> Result<(), EfattureError> {
    let format = f.text(&format!("{TRANSMISSION}/FormatoTrasmissione"))?;
    if !matches!(format.as_deref(), Some("FPA12" | "FPR12")) {
        report.insert(
            codes::FORMAT_VERSION_MISMATCH,
            format!(
                "1.1.3 <FormatoTrasmissione> {} con valore diverso da FPA12 e FPR12",
                format.as_deref().unwrap_or_default()
            ),
        );
    }
    let version = f.doc.root().attribute("versione");
    if version != format.as_deref() {
        report.insert(
            codes::FORMAT_VERSION_MISMATCH,
            format!(
                "1.1.3 <FormatoTrasmissione> {} non coerente con il valore dell'attributo VERSION {}",
                format.as_deref().unwrap_or_default(),
                version.unwrap_or_default()
            ),
        );
    }
    Ok(())
}

// 00429 / 00430
fn summary_natura(f: &Fields<'_>, report: &mut ValidationReport) -> Result<(), EfattureError> {
    for i in 1..=f.bodies()? {
        let summaries = format!("{}/DatiBeniServizi/DatiRiepilogo", body(i));
        for j in 1..=f.count(&summaries)? {
            let rate = f.amount_or_zero(&format!("{summaries}[{j}]/AliquotaIVA"))?;
            let natura = f.text(&format!("{summaries}[{j}]/Natura"))?;
            match (rate.is_zero(), natura) {
                (true, None) => report.insert(
                    codes::SUMMARY_NATURA_MISSING_AT_ZERO_RATE,
                    format!(
                        "2.2.2.2 <Natura> non presente a fronte di 2.2.2.1 <AliquotaIVA> {rate} pari a zero (nei <DatiRiepilogo>, l'indicazione di un'aliquota IVA pari a zero obbliga all'indicazione della natura che giustifichi la non imponibilità)"
                    ),
                ),
                (false, Some(natura)) => report.insert(
                    codes::SUMMARY_NATURA_AT_NONZERO_RATE,
                    format!(
                        "2.2.2.2 <Natura> {natura} presente a fronte di 2.2.2.1 <AliquotaIVA> {rate} diversa da zero"
                    ),
                ),
                _ => {}
            }
        }
    }
    Ok(())
}

// 00437 / 00438
fn discounts(f: &Fields<'_>, report: &mut ValidationReport) -> Result<(), EfattureError> {
    let incomplete = |group: &str| -> Result<bool, EfattureError> {
        Ok(f.text(&format!("{group}/Tipo"))?.is_some()
            && f.text(&format!("{group}/Percentuale"))?.is_none()
            && f.text(&format!("{group}/Importo"))?.is_none())
    };

    for i in 1..=f.bodies()? {
        let document_level = format!("{}/{DOCUMENT}/ScontoMaggiorazione", body(i));
        for j in 1..=f.count(&document_level)? {
            if incomplete(&format!("{document_level}[{j}]"))? {
                report.insert(
                    codes::DOCUMENT_DISCOUNT_INCOMPLETE,
                    "2.1.1.8.2 <Percentuale> e 2.1.1.8.3 <Importo> non presenti a fronte di 2.1.1.8.1 <Tipo> valorizzato (l'indicazione della presenza di uno sconto o di una maggiorazione, obbliga all'indicazione di almeno uno degli elementi <Percentuale> e <Importo> dello sconto/maggiorazione)",
                );
            }
        }

        let lines = format!("{}/DatiBeniServizi/DettaglioLinee", body(i));
        for j in 1..=f.count(&lines)? {
            let line_level = format!("{lines}[{j}]/ScontoMaggiorazione");
            for k in 1..=f.count(&line_level)? {
                if incomplete(&format!("{line_level}[{k}]"))? {
                    report.insert(
                        codes::LINE_DISCOUNT_INCOMPLETE,
                        format!(
                            "2.2.1.10.2 <Percentuale> e 2.2.1.10.3 <Importo> non presenti a fronte di 2.2.1.10.1 <Tipo> valorizzato (linea {j})"
                        ),
                    );
                }
            }
        }
    }
    Ok(())
}
