//! SdI error-code taxonomy.
//!
//! Codes raised locally by [`BusinessRuleValidator`](super::BusinessRuleValidator)
//! and [`DateSanityValidator`](super::DateSanityValidator) have named
//! constants. [`description`] also knows the codes only the SdI itself can
//! raise (signature checks, duplicates, registry lookups) and the ones the
//! web service returns, so that an [`EfattureError::Api`](crate::core::EfattureError::Api)
//! code can be explained.

pub const SIZE_EXCEEDED: &str = "00003";
pub const FORMAT_NONCONFORMING: &str = "00200";
pub const TOO_MANY_FORMAT_ERRORS: &str = "00201";
pub const NATURA_MISSING_AT_ZERO_RATE: &str = "00400";
pub const NATURA_AT_NONZERO_RATE: &str = "00401";
pub const DATE_IN_FUTURE: &str = "00403";
pub const WITHHOLDING_DATA_MISSING: &str = "00411";
pub const FUND_NATURA_MISSING_AT_ZERO_RATE: &str = "00413";
pub const FUND_NATURA_AT_NONZERO_RATE: &str = "00414";
pub const FUND_WITHHOLDING_DATA_MISSING: &str = "00415";
pub const BUYER_TAX_ID_MISSING: &str = "00417";
pub const DATE_BEFORE_LINKED_INVOICE: &str = "00418";
pub const SUMMARY_MISSING_FOR_RATE: &str = "00419";
pub const REVERSE_CHARGE_WITH_SPLIT_PAYMENT: &str = "00420";
pub const TAX_MISCALCULATED: &str = "00421";
pub const TAXABLE_MISCALCULATED: &str = "00422";
pub const LINE_TOTAL_MISCALCULATED: &str = "00423";
pub const RATE_NOT_PERCENTAGE: &str = "00424";
pub const NUMBER_WITHOUT_DIGITS: &str = "00425";
pub const RECIPIENT_CODE_LENGTH: &str = "00427";
pub const FORMAT_VERSION_MISMATCH: &str = "00428";
pub const SUMMARY_NATURA_MISSING_AT_ZERO_RATE: &str = "00429";
pub const SUMMARY_NATURA_AT_NONZERO_RATE: &str = "00430";
pub const DOCUMENT_DISCOUNT_INCOMPLETE: &str = "00437";
pub const LINE_DISCOUNT_INCOMPLETE: &str = "00438";

/// Official description of `code`, if known.
pub fn description(code: &str) -> Option<&'static str> {
    DESCRIPTIONS
        .binary_search_by(|(c, _)| (*c).cmp(code))
        .ok()
        .map(|i| DESCRIPTIONS[i].1)
}

/// Sorted by code for binary search.
static DESCRIPTIONS: &[(&str, &str)] = &[
    ("00001", "Nome file non valido"),
    ("00002", "Nome file duplicato"),
    ("00003", "Le dimensioni del file superano quelle ammesse"),
    ("00100", "Certificato di firma scaduto"),
    ("00101", "Certificato di firma revocato"),
    ("00102", "File non integro (firma non valida)"),
    ("00103", "La firma digitale apposta manca del riferimento temporale"),
    ("00104", "CA (Certification Authority) non affidabile"),
    ("00105", "Il riferimento temporale della firma digitale apposta non è coerente"),
    ("00106", "File / archivio vuoto o corrotto"),
    ("00107", "Certificato non valido"),
    ("00200", "File non conforme al formato"),
    ("00201", "Riscontrati più di 50 errori di formato"),
    ("00300", "1.1.1.2 <IdCodice> non valido"),
    ("00301", "1.2.1.1.2 <IdCodice> non valido"),
    ("00302", "Il Codice Fiscale del Cedente/Prestatore non è valido"),
    ("00303", "1.3.1.1.2 <IdCodice> o 1.4.4.1.2 <IdCodice> non valido"),
    ("00304", "Codice Fiscale del Cedente/Prestatore non presente in Anagrafe Tributaria"),
    ("00305", "1.4.1.1.2 <IdCodice> non valido"),
    ("00306", "1.4.1.2 <CodiceFiscale> non valido"),
    ("00311", "1.1.4 <CodiceDestinatario> non valido"),
    ("00312", "1.1.4 <CodiceDestinatario> non attivo"),
    ("00400", "2.2.1.14 <Natura> non presente a fronte di 2.2.1.12 <AliquotaIVA> pari a zero"),
    ("00401", "2.2.1.14 <Natura> presente a fronte di 2.2.1.12 <AliquotaIVA> diversa da zero"),
    (
        "00403",
        "2.1.1.3 <Data> successiva alla data di ricezione (la data della fattura non può essere successiva alla data in cui la stessa è ricevuta dal SdI)",
    ),
    ("00404", "Fattura duplicata"),
    ("00409", "Fattura duplicata nel lotto"),
    (
        "00411",
        "2.1.1.5 <DatiRitenuta> non presente a fronte di almeno un blocco 2.2.1 <DettaglioLinee> con 2.2.1.13 <Ritenuta> uguale a SI",
    ),
    ("00413", "2.1.1.7.7 <Natura> non presente a fronte di 2.1.1.7.5 <AliquotaIVA> pari a zero"),
    ("00414", "2.1.1.7.7 <Natura> presente a fronte di 2.1.1.7.5 <Aliquota IVA> diversa da zero"),
    ("00415", "2.1.1.5 <DatiRitenuta> non presente a fronte di 2.1.1.7.6 <Ritenuta> uguale a SI"),
    (
        "00417",
        "1.4.1.1 <IdFiscaleIVA> e 1.4.1.2 <CodiceFiscale> non valorizzati (almeno uno dei due deve essere valorizzato)",
    ),
    ("00418", "2.1.1.3 <Data> antecedente a 2.1.6.3 <Data>"),
    (
        "00419",
        "2.2.2 <DatiRiepilogo> non presente in corrispondenza di almeno un valore di 2.1.1.7.5 <AliquotaIVA> o 2.2.1.12 <AliquotaIVA>",
    ),
    (
        "00420",
        "2.2.2.2 <Natura> con valore N6 (inversione contabile) a fronte di 2.2.2.7 <EsigibilitaIVA> uguale a S (scissione pagamenti)",
    ),
    ("00421", "2.2.2.6 <Imposta> non calcolato secondo le regole definite nelle specifiche tecniche"),
    (
        "00422",
        "2.2.2.5 <ImponibileImporto> non calcolato secondo le regole definite nelle specifiche tecniche",
    ),
    (
        "00423",
        "2.2.1.11 <PrezzoTotale> non calcolato secondo le regole definite nelle specifiche tecniche",
    ),
    (
        "00424",
        "2.2.1.12 <AliquotaIVA> o 2.2.2.1 <AliquotaIVA> o 2.1.1.7.5 <AliquotaIVA> non indicata in termini percentuali",
    ),
    (
        "00425",
        "2.1.1.4 <Numero> non contenente caratteri numerici (il numero della fattura deve contenere almeno un carattere numerico)",
    ),
    (
        "00427",
        "1.1.4 <CodiceDestinatario> di lunghezza non coerente con 1.1.3 <FormatoTrasmissione>",
    ),
    ("00428", "1.1.3 <FormatoTrasmissione> non coerente con il valore dell'attributo VERSION"),
    ("00429", "2.2.2.2 <Natura> non presente a fronte di 2.2.2.1 <AliquotaIVA> pari a zero"),
    ("00430", "2.2.2.2 <Natura> presente a fronte di 2.2.2.1 <AliquotaIVA> diversa da zero"),
    (
        "00437",
        "2.1.1.8.2 <Percentuale> e 2.1.1.8.3 <Importo> non presenti a fronte di 2.1.1.8.1 <Tipo> valorizzato",
    ),
    (
        "00438",
        "2.2.1.10.2 <Percentuale> e 2.2.1.10.3 <Importo> non presenti a fronte di 2.2.1.10.1 <Tipo> valorizzato",
    ),
    ("ES01", "File validato"),
    ("ES02", "File validato con segnalazione"),
    ("ES03", "File scartato"),
    ("SYS_00001", "Errore inatteso"),
    ("SYS_00002", "Missing request parameter"),
    ("SYS_00003", "Invalid request parameter"),
    ("SYS_00004", "Authentication error"),
];
