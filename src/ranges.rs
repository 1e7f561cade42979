/// One band of the lookup table. Bounds are written zero-padded to five
/// characters so lexical and numeric order agree within a family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeRange {
    pub low: &'static str,
    pub high: &'static str,
    pub category: &'static str,
    pub subcategory: &'static str,
    pub description: &'static str,
}

impl CodeRange {
    const fn new(
        low: &'static str,
        high: &'static str,
        category: &'static str,
        subcategory: &'static str,
        description: &'static str,
    ) -> Self {
        Self {
            low,
            high,
            category,
            subcategory,
            description,
        }
    }

    /// Integer bounds, or `None` when either bound is not a plain number.
    pub fn numeric_bounds(&self) -> Option<(u64, u64)> {
        let low = self.low.parse::<u64>().ok()?;
        let high = self.high.parse::<u64>().ok()?;
        Some((low, high))
    }
}

const HCPCS: &str = "HCPCS Level II";
const SURGERY: &str = "Surgery";
const EM: &str = "Evaluation and Management";

/// Lookup table scanned in order; the first band containing a code wins.
pub static CODE_RANGES: &[CodeRange] = &[
    CodeRange::new(
        "00100",
        "01999",
        "Anesthesia",
        "General",
        "Anesthesia for surgical procedures",
    ),
    CodeRange::new(
        "10000",
        "19999",
        SURGERY,
        "Integumentary System",
        "Procedures on the skin and subcutaneous tissue",
    ),
    CodeRange::new(
        "20000",
        "29999",
        SURGERY,
        "Musculoskeletal System",
        "Procedures on bones, joints and muscles",
    ),
    CodeRange::new(
        "30000",
        "32999",
        SURGERY,
        "Respiratory System",
        "Procedures on the nose, larynx, trachea and lungs",
    ),
    CodeRange::new(
        "33010",
        "37799",
        SURGERY,
        "Cardiovascular System",
        "Procedures on the heart and blood vessels",
    ),
    CodeRange::new(
        "38100",
        "38999",
        SURGERY,
        "Hemic and Lymphatic Systems",
        "Procedures on the spleen, bone marrow and lymph nodes",
    ),
    CodeRange::new(
        "39000",
        "39599",
        SURGERY,
        "Mediastinum and Diaphragm",
        "Procedures on the mediastinum and diaphragm",
    ),
    CodeRange::new(
        "40490",
        "49999",
        SURGERY,
        "Digestive System",
        "Procedures on the digestive tract and abdomen",
    ),
    CodeRange::new(
        "50010",
        "53899",
        SURGERY,
        "Urinary System",
        "Procedures on the kidneys, ureters, bladder and urethra",
    ),
    CodeRange::new(
        "54000",
        "55899",
        SURGERY,
        "Male Genital System",
        "Procedures on the male reproductive organs",
    ),
    CodeRange::new(
        "55920",
        "58999",
        SURGERY,
        "Female Genital System",
        "Procedures on the female reproductive organs",
    ),
    CodeRange::new(
        "59000",
        "59899",
        SURGERY,
        "Maternity Care and Delivery",
        "Obstetric procedures and delivery",
    ),
    CodeRange::new(
        "60000",
        "60699",
        SURGERY,
        "Endocrine System",
        "Procedures on the thyroid, parathyroid and adrenal glands",
    ),
    CodeRange::new(
        "61000",
        "64999",
        SURGERY,
        "Nervous System",
        "Procedures on the skull, spine and nerves",
    ),
    CodeRange::new(
        "65091",
        "68899",
        SURGERY,
        "Eye and Ocular Adnexa",
        "Procedures on the eye and surrounding structures",
    ),
    CodeRange::new(
        "69000",
        "69979",
        SURGERY,
        "Auditory System",
        "Procedures on the ear",
    ),
    CodeRange::new(
        "70010",
        "79999",
        "Radiology",
        "Diagnostic Imaging",
        "Radiologic exam and imaging",
    ),
    CodeRange::new(
        "80047",
        "89398",
        "Pathology and Laboratory",
        "Laboratory Testing",
        "Clinical laboratory and pathology services",
    ),
    CodeRange::new(
        "90281",
        "99199",
        "Medicine",
        "Medical Services",
        "Non-invasive diagnostic and therapeutic services",
    ),
    CodeRange::new(
        "99202",
        "99215",
        EM,
        "Office Visits",
        "Medical visit and consultation services",
    ),
    CodeRange::new(
        "99217",
        "99239",
        EM,
        "Hospital Inpatient and Observation Care",
        "Hospital and observation care services",
    ),
    CodeRange::new(
        "99241",
        "99255",
        EM,
        "Consultations",
        "Office and inpatient consultations",
    ),
    CodeRange::new(
        "99281",
        "99288",
        EM,
        "Emergency Department Services",
        "Emergency department visits",
    ),
    CodeRange::new(
        "99291",
        "99292",
        EM,
        "Critical Care Services",
        "Critical care of the critically ill or injured patient",
    ),
    CodeRange::new(
        "99304",
        "99318",
        EM,
        "Nursing Facility Services",
        "Nursing facility visits",
    ),
    CodeRange::new(
        "99324",
        "99350",
        EM,
        "Home or Residence Services",
        "Domiciliary, rest home and home visits",
    ),
    CodeRange::new(
        "99358",
        "99380",
        EM,
        "Prolonged and Care Plan Services",
        "Prolonged services and care plan oversight",
    ),
    CodeRange::new(
        "99381",
        "99429",
        EM,
        "Preventive Medicine Services",
        "Preventive medicine evaluation and counseling",
    ),
    CodeRange::new(
        "99441",
        "99499",
        EM,
        "Other Evaluation and Management Services",
        "Telephone, online, care management and other E/M services",
    ),
    CodeRange::new(
        "99500",
        "99607",
        "Medicine",
        "Home Health Procedures",
        "Home health procedures and services",
    ),
    CodeRange::new(
        "A0000",
        "A0999",
        HCPCS,
        "Transportation Services",
        "Ambulance and medical transport",
    ),
    CodeRange::new(
        "A4000",
        "A8999",
        HCPCS,
        "Medical and Surgical Supplies",
        "Medical and surgical supplies",
    ),
    CodeRange::new(
        "A9000",
        "A9999",
        HCPCS,
        "Administrative and Miscellaneous",
        "Administrative, miscellaneous and investigational services",
    ),
    CodeRange::new(
        "B4000",
        "B9999",
        HCPCS,
        "Enteral and Parenteral Therapy",
        "Enteral and parenteral nutrition supplies",
    ),
    CodeRange::new(
        "C1000",
        "C9999",
        HCPCS,
        "Outpatient PPS",
        "Hospital outpatient prospective payment system items",
    ),
    CodeRange::new(
        "D0000",
        "D9999",
        HCPCS,
        "Dental Procedures",
        "Dental procedures and services",
    ),
    CodeRange::new(
        "E0000",
        "E9999",
        HCPCS,
        "Durable Medical Equipment",
        "Durable medical equipment",
    ),
    CodeRange::new(
        "G0000",
        "G9999",
        HCPCS,
        "Procedures and Professional Services",
        "Temporary procedures and professional services",
    ),
    CodeRange::new(
        "H0000",
        "H9999",
        HCPCS,
        "Behavioral Health",
        "Alcohol, drug abuse and behavioral health treatment services",
    ),
    CodeRange::new(
        "J0000",
        "J9999",
        HCPCS,
        "Drugs Administered Other Than Oral Method",
        "Injectable drugs, chemotherapy and immunosuppressive drugs",
    ),
    CodeRange::new(
        "K0000",
        "K9999",
        HCPCS,
        "Temporary Codes for DME MACs",
        "Temporary durable medical equipment codes",
    ),
    CodeRange::new(
        "L0000",
        "L9999",
        HCPCS,
        "Orthotic and Prosthetic Procedures",
        "Orthotics, prosthetics and related devices",
    ),
    CodeRange::new(
        "M0000",
        "M9999",
        HCPCS,
        "Other Medical Services",
        "Medical services and quality measures",
    ),
    CodeRange::new(
        "P0000",
        "P9999",
        HCPCS,
        "Laboratory Services",
        "Pathology and laboratory services",
    ),
    CodeRange::new(
        "Q0000",
        "Q9999",
        HCPCS,
        "Temporary Codes",
        "Temporary codes for drugs, biologicals and supplies",
    ),
    CodeRange::new(
        "R0000",
        "R9999",
        HCPCS,
        "Diagnostic Radiology Services",
        "Portable x-ray and diagnostic radiology transport",
    ),
    CodeRange::new(
        "S0000",
        "S9999",
        HCPCS,
        "Temporary National Codes (Non-Medicare)",
        "Private payer temporary codes",
    ),
    CodeRange::new(
        "T0000",
        "T9999",
        HCPCS,
        "State Medicaid Agency Codes",
        "National codes established for state Medicaid agencies",
    ),
    CodeRange::new(
        "U0000",
        "U9999",
        HCPCS,
        "Coronavirus Diagnostic Panel",
        "Coronavirus laboratory testing",
    ),
    CodeRange::new(
        "V0000",
        "V9999",
        HCPCS,
        "Vision and Hearing Services",
        "Vision, hearing and speech-language pathology services",
    ),
    CodeRange::new(
        "0001U",
        "9999U",
        "Proprietary Laboratory Analyses",
        "PLA",
        "Proprietary laboratory analyses",
    ),
];
