//! Entity Wire Models
//!
//! Patients, doctors, hospitals and nationalities as the API stores them.
//! Field names on the wire are the server's form names; the Rust names say
//! what the field holds.

use base64::Engine;
use chrono::NaiveDate;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::types::FILE_NUMBER_DIGITS;

/// A record type persisted behind `/manger_data/{collection}`
pub trait Entity: DeserializeOwned + Send + Sync + 'static {
    /// Collection segment of the entity routes
    const COLLECTION: &'static str;

    /// Name used in user-facing messages
    const LABEL: &'static str;

    /// Body sent on create
    type Draft: Serialize + Send + Sync;

    /// Body sent on update; unset fields are left untouched by the server
    type Patch: Serialize + Send + Sync;

    /// Server-assigned identifier
    fn id(&self) -> &str;
}

/// Relation of the patient to the employee the leave is issued for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    /// Father
    #[default]
    Father,
    /// Son
    Son,
    /// Mother
    Mother,
    /// Daughter
    Daughter,
    /// Husband
    Husband,
    /// Brother
    Brother,
    /// Value the client does not know about
    #[serde(other)]
    Other,
}

/// Kind of visit the certificate covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisitType {
    /// Outpatient clinic visit
    #[default]
    Outpatient,
    /// Emergency department visit
    Emergency,
    /// Value the client does not know about
    #[serde(other)]
    Other,
}

/// Ownership of a hospital
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HospitalType {
    /// Government hospital
    #[default]
    #[serde(rename = "GSL")]
    Government,
    /// Private hospital
    #[serde(rename = "PSL")]
    Private,
}

/// A patient record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    /// Server-assigned identifier
    #[serde(rename = "_id")]
    pub id: String,
    /// Patient name
    #[serde(rename = "inputnamear", default)]
    pub name: String,
    /// National identity number
    #[serde(rename = "inputidentity", default)]
    pub identity: String,
    /// First day of the leave, `YYYY-MM-DD`
    #[serde(rename = "inputdatefrom", default)]
    pub date_from: String,
    /// Last day of the leave, `YYYY-MM-DD`
    #[serde(rename = "inputdateto", default)]
    pub date_to: String,
    /// Start time, `HH:MM`
    #[serde(rename = "inputtimefrom", default)]
    pub time_from: String,
    /// End time, `HH:MM`
    #[serde(rename = "inputtimeto", default)]
    pub time_to: String,
    /// Employer name
    #[serde(rename = "inputemployer", default)]
    pub employer: String,
    /// Relation to the employee
    #[serde(rename = "inputrelation", default)]
    pub relation: Relation,
    /// Visit type
    #[serde(rename = "inputvisittype", default)]
    pub visit_type: VisitType,
    /// Linked nationality
    #[serde(rename = "nationalityId", default)]
    pub nationality_id: String,
    /// Linked doctor
    #[serde(rename = "doctorId", default)]
    pub doctor_id: String,
    /// Linked hospital
    #[serde(rename = "hospitalId", default)]
    pub hospital_id: String,
    /// Inclusive number of leave days, as the server stores it
    #[serde(rename = "inputdaynum", default)]
    pub day_count: String,
    /// Generated file number
    #[serde(rename = "inputgsl", default)]
    pub file_number: String,
    /// Nationality name resolved by the server
    #[serde(rename = "inputnationalityar", default, skip_serializing_if = "Option::is_none")]
    pub nationality_name: Option<String>,
    /// Visit type label resolved by the server
    #[serde(rename = "inputTypeVisitAr", default, skip_serializing_if = "Option::is_none")]
    pub visit_type_label: Option<String>,
}

impl Patient {
    /// Parsed day count, if the server stored a number
    pub fn days(&self) -> Option<u32> {
        self.day_count.trim().parse().ok()
    }
}

/// Body of a patient create request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientDraft {
    #[serde(rename = "inputnamear")]
    pub name: String,
    #[serde(rename = "inputidentity")]
    pub identity: String,
    #[serde(rename = "inputdatefrom")]
    pub date_from: String,
    #[serde(rename = "inputdateto")]
    pub date_to: String,
    #[serde(rename = "inputtimefrom")]
    pub time_from: String,
    #[serde(rename = "inputtimeto")]
    pub time_to: String,
    #[serde(rename = "inputemployer")]
    pub employer: String,
    #[serde(rename = "inputrelation")]
    pub relation: Relation,
    #[serde(rename = "inputvisittype")]
    pub visit_type: VisitType,
    #[serde(rename = "nationalityId")]
    pub nationality_id: String,
    #[serde(rename = "doctorId")]
    pub doctor_id: String,
    #[serde(rename = "hospitalId")]
    pub hospital_id: String,
    #[serde(rename = "inputdaynum")]
    pub day_count: String,
    #[serde(rename = "inputgsl")]
    pub file_number: String,
}

/// Body of a patient update request
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PatientPatch {
    #[serde(rename = "inputnamear", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "inputidentity", skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
    #[serde(rename = "inputdatefrom", skip_serializing_if = "Option::is_none")]
    pub date_from: Option<String>,
    #[serde(rename = "inputdateto", skip_serializing_if = "Option::is_none")]
    pub date_to: Option<String>,
    #[serde(rename = "inputtimefrom", skip_serializing_if = "Option::is_none")]
    pub time_from: Option<String>,
    #[serde(rename = "inputtimeto", skip_serializing_if = "Option::is_none")]
    pub time_to: Option<String>,
    #[serde(rename = "inputemployer", skip_serializing_if = "Option::is_none")]
    pub employer: Option<String>,
    #[serde(rename = "inputrelation", skip_serializing_if = "Option::is_none")]
    pub relation: Option<Relation>,
    #[serde(rename = "inputvisittype", skip_serializing_if = "Option::is_none")]
    pub visit_type: Option<VisitType>,
    #[serde(rename = "nationalityId", skip_serializing_if = "Option::is_none")]
    pub nationality_id: Option<String>,
    #[serde(rename = "doctorId", skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<String>,
    #[serde(rename = "hospitalId", skip_serializing_if = "Option::is_none")]
    pub hospital_id: Option<String>,
    #[serde(rename = "inputdaynum", skip_serializing_if = "Option::is_none")]
    pub day_count: Option<String>,
}

impl PatientPatch {
    /// Sets both ends of the leave and recomputes the day count
    pub fn with_dates(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.date_from = Some(from.format("%Y-%m-%d").to_string());
        self.date_to = Some(to.format("%Y-%m-%d").to_string());
        self.day_count = Some(inclusive_day_count(from, to).to_string());
        self
    }
}

impl Entity for Patient {
    const COLLECTION: &'static str = "patients";
    const LABEL: &'static str = "المريض";
    type Draft = PatientDraft;
    type Patch = PatientPatch;

    fn id(&self) -> &str {
        &self.id
    }
}

/// A doctor record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "input_doctor_name_ar", default)]
    pub name_ar: String,
    #[serde(rename = "input_doctor_name_En", default)]
    pub name_en: String,
    #[serde(rename = "input_doctor_type_ar", default)]
    pub specialization_ar: String,
    #[serde(rename = "input_doctor_type_En", default)]
    pub specialization_en: String,
    /// Code matching [`Hospital::doctor_link_code`]
    #[serde(rename = "input_doctor_num", default)]
    pub link_code: String,
}

/// Body of a doctor create request
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DoctorDraft {
    #[serde(rename = "input_doctor_name_ar")]
    pub name_ar: String,
    #[serde(rename = "input_doctor_name_En")]
    pub name_en: String,
    #[serde(rename = "input_doctor_type_ar")]
    pub specialization_ar: String,
    #[serde(rename = "input_doctor_type_En")]
    pub specialization_en: String,
    #[serde(rename = "input_doctor_num")]
    pub link_code: String,
}

/// Body of a doctor update request
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DoctorPatch {
    #[serde(rename = "input_doctor_name_ar", skip_serializing_if = "Option::is_none")]
    pub name_ar: Option<String>,
    #[serde(rename = "input_doctor_name_En", skip_serializing_if = "Option::is_none")]
    pub name_en: Option<String>,
    #[serde(rename = "input_doctor_type_ar", skip_serializing_if = "Option::is_none")]
    pub specialization_ar: Option<String>,
    #[serde(rename = "input_doctor_type_En", skip_serializing_if = "Option::is_none")]
    pub specialization_en: Option<String>,
    #[serde(rename = "input_doctor_num", skip_serializing_if = "Option::is_none")]
    pub link_code: Option<String>,
}

impl Entity for Doctor {
    const COLLECTION: &'static str = "doctors";
    const LABEL: &'static str = "الطبيب";
    type Draft = DoctorDraft;
    type Patch = DoctorPatch;

    fn id(&self) -> &str {
        &self.id
    }
}

/// A hospital record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hospital {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "input_central_type", default)]
    pub kind: HospitalType,
    #[serde(rename = "input_central_name_ar", default)]
    pub name_ar: String,
    #[serde(rename = "input_central_name_en", default)]
    pub name_en: String,
    /// License identifier
    #[serde(rename = "input_central_id", default)]
    pub license_id: String,
    /// Base64 encoded logo image
    #[serde(rename = "input_central_logo", default)]
    pub logo: String,
    #[serde(rename = "input_central_location", default)]
    pub location: String,
    /// Code shared with the doctors working here
    #[serde(rename = "input_central_doctor_num", default)]
    pub doctor_link_code: String,
}

impl Hospital {
    /// Decodes the logo, `None` when the hospital has no logo
    pub fn decode_logo(&self) -> Option<Result<Vec<u8>, base64::DecodeError>> {
        if self.logo.trim().is_empty() {
            return None;
        }
        Some(decode_logo(&self.logo))
    }

    /// Label used in selection lists: "location - name"
    pub fn display_name(&self) -> String {
        format!("{} - {}", self.location, self.name_ar)
    }
}

/// Body of a hospital create request
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HospitalDraft {
    #[serde(rename = "input_central_type")]
    pub kind: HospitalType,
    #[serde(rename = "input_central_name_ar")]
    pub name_ar: String,
    #[serde(rename = "input_central_name_en")]
    pub name_en: String,
    #[serde(rename = "input_central_id")]
    pub license_id: String,
    #[serde(rename = "input_central_logo")]
    pub logo: String,
    #[serde(rename = "input_central_location")]
    pub location: String,
    #[serde(rename = "input_central_doctor_num")]
    pub doctor_link_code: String,
}

/// Body of a hospital update request
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HospitalPatch {
    #[serde(rename = "input_central_type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<HospitalType>,
    #[serde(rename = "input_central_name_ar", skip_serializing_if = "Option::is_none")]
    pub name_ar: Option<String>,
    #[serde(rename = "input_central_name_en", skip_serializing_if = "Option::is_none")]
    pub name_en: Option<String>,
    #[serde(rename = "input_central_id", skip_serializing_if = "Option::is_none")]
    pub license_id: Option<String>,
    #[serde(rename = "input_central_logo", skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(rename = "input_central_location", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(rename = "input_central_doctor_num", skip_serializing_if = "Option::is_none")]
    pub doctor_link_code: Option<String>,
}

impl Entity for Hospital {
    const COLLECTION: &'static str = "hospitals";
    const LABEL: &'static str = "المستشفى";
    type Draft = HospitalDraft;
    type Patch = HospitalPatch;

    fn id(&self) -> &str {
        &self.id
    }
}

/// A nationality record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nationality {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "input_national_ar", default)]
    pub name_ar: String,
    #[serde(rename = "input_national_en", default)]
    pub name_en: String,
}

/// Body of a nationality create request
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NationalityDraft {
    #[serde(rename = "input_national_ar")]
    pub name_ar: String,
    #[serde(rename = "input_national_en")]
    pub name_en: String,
}

/// Body of a nationality update request
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NationalityPatch {
    #[serde(rename = "input_national_ar", skip_serializing_if = "Option::is_none")]
    pub name_ar: Option<String>,
    #[serde(rename = "input_national_en", skip_serializing_if = "Option::is_none")]
    pub name_en: Option<String>,
}

impl Entity for Nationality {
    const COLLECTION: &'static str = "nationalities";
    const LABEL: &'static str = "الجنسية";
    type Draft = NationalityDraft;
    type Patch = NationalityPatch;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Acknowledgement returned by delete routes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOutcome {
    /// Whether the server removed the record
    #[serde(default = "default_success")]
    pub success: bool,
}

fn default_success() -> bool {
    true
}

/// Envelope of the search route
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct SearchEnvelope {
    #[serde(default)]
    pub users: Option<Vec<Patient>>,
}

/// Inclusive number of days between two dates, order-insensitive
///
/// A leave starting and ending on the same day lasts one day.
pub fn inclusive_day_count(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days().abs() + 1
}

/// Draws a zero-padded six digit file number
pub fn generate_file_number<R: Rng>(rng: &mut R) -> String {
    let upper = 10u32.pow(FILE_NUMBER_DIGITS as u32);
    format!("{:0width$}", rng.gen_range(0..upper), width = FILE_NUMBER_DIGITS)
}

/// Doctors that can be picked for a hospital
///
/// Doctors whose link code equals the hospital's are offered. When none
/// match, every doctor is offered.
pub fn doctors_for_hospital<'a>(hospital: &Hospital, doctors: &'a [Doctor]) -> Vec<&'a Doctor> {
    let matching: Vec<&Doctor> = doctors
        .iter()
        .filter(|d| d.link_code == hospital.doctor_link_code)
        .collect();
    if matching.is_empty() {
        doctors.iter().collect()
    } else {
        matching
    }
}

/// Decodes a base64 logo, tolerating a `data:` URL prefix
pub fn decode_logo(logo: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let payload = match logo.split_once(";base64,") {
        Some((_, rest)) => rest,
        None => logo,
    };
    base64::engine::general_purpose::STANDARD.decode(payload.trim())
}
