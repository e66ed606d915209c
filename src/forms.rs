//! Entity Forms
//!
//! Form state for adding and editing records, with the validation and
//! derived fields the server expects. Submitting a form reports the outcome
//! through a [`Notifier`].

use chrono::{NaiveDate, NaiveTime};
use tracing::warn;

use crate::client::PatientApi;
use crate::errors::{ApiError, Result};
use crate::models::{
    decode_logo, doctors_for_hospital, inclusive_day_count, Doctor, DoctorDraft, Entity,
    Hospital, HospitalDraft, HospitalType, Nationality, NationalityDraft, Patient, PatientDraft,
    PatientPatch, Relation, VisitType,
};
use crate::notify::{messages, Notifier};
use crate::operations::EntityApi;

/// Longest identity number the form accepts
pub const MAX_IDENTITY_LEN: usize = 10;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

/// A form that creates one kind of record
pub trait EntityForm {
    /// Record type the form produces
    type Target: Entity;

    /// Checks every field, failing on the first invalid one
    fn validate(&self) -> Result<()>;

    /// Builds the create body; only called after `validate` passed
    fn to_draft(&self) -> <Self::Target as Entity>::Draft;
}

/// Validates and submits a form, notifying the user of the outcome
pub async fn submit_form<F: EntityForm>(
    form: &F,
    api: &EntityApi<F::Target>,
    notifier: &dyn Notifier,
) -> Result<F::Target> {
    let result = match form.validate() {
        Ok(()) => api.create(&form.to_draft()).await,
        Err(e) => Err(e),
    };
    match &result {
        Ok(_) => notifier.notify(messages::added(<F::Target as Entity>::LABEL)),
        Err(e) => {
            let collection = <F::Target as Entity>::COLLECTION;
            warn!(collection, error = %e, "create failed");
            notifier.notify(messages::add_failed());
        }
    }
    result
}

fn required(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation {
            field,
            message: "required".to_string(),
        });
    }
    Ok(())
}

fn required_some<T>(field: &'static str, value: Option<T>) -> Result<T> {
    value.ok_or(ApiError::Validation {
        field,
        message: "required".to_string(),
    })
}

/// Add / edit form of a patient
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientForm {
    pub name: String,
    pub identity: String,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub time_from: Option<NaiveTime>,
    pub time_to: Option<NaiveTime>,
    pub employer: String,
    pub relation: Relation,
    pub visit_type: VisitType,
    pub nationality_id: String,
    pub doctor_id: String,
    pub hospital_id: String,
}

impl PatientForm {
    /// Loads a stored patient into an edit form
    ///
    /// Dates and times the server stored in another format are left empty.
    pub fn from_patient(patient: &Patient) -> Self {
        Self {
            name: patient.name.clone(),
            identity: patient.identity.clone(),
            date_from: NaiveDate::parse_from_str(&patient.date_from, DATE_FORMAT).ok(),
            date_to: NaiveDate::parse_from_str(&patient.date_to, DATE_FORMAT).ok(),
            time_from: NaiveTime::parse_from_str(&patient.time_from, TIME_FORMAT).ok(),
            time_to: NaiveTime::parse_from_str(&patient.time_to, TIME_FORMAT).ok(),
            employer: patient.employer.clone(),
            relation: patient.relation,
            visit_type: patient.visit_type,
            nationality_id: patient.nationality_id.clone(),
            doctor_id: patient.doctor_id.clone(),
            hospital_id: patient.hospital_id.clone(),
        }
    }

    /// Selects a hospital and returns the doctors to offer for it
    ///
    /// The first matching doctor is preselected when no doctor is chosen yet.
    pub fn select_hospital<'a>(&mut self, hospital: &Hospital, doctors: &'a [Doctor]) -> Vec<&'a Doctor> {
        self.hospital_id = hospital.id.clone();
        let offered = doctors_for_hospital(hospital, doctors);
        if self.doctor_id.is_empty() {
            if let Some(first) = offered
                .iter()
                .find(|d| d.link_code == hospital.doctor_link_code)
            {
                self.doctor_id = first.id.clone();
            }
        }
        offered
    }

    /// Inclusive number of leave days, once both dates are set
    pub fn day_count(&self) -> Option<i64> {
        Some(inclusive_day_count(self.date_from?, self.date_to?))
    }

    /// Checks every field, failing on the first invalid one
    pub fn validate(&self) -> Result<()> {
        required("inputnamear", &self.name)?;
        required("inputidentity", &self.identity)?;
        if self.identity.trim().chars().count() > MAX_IDENTITY_LEN {
            return Err(ApiError::Validation {
                field: "inputidentity",
                message: format!("at most {} characters", MAX_IDENTITY_LEN),
            });
        }
        required_some("inputdatefrom", self.date_from)?;
        required_some("inputdateto", self.date_to)?;
        required_some("inputtimefrom", self.time_from)?;
        required_some("inputtimeto", self.time_to)?;
        required("inputemployer", &self.employer)?;
        required("nationalityId", &self.nationality_id)?;
        required("hospitalId", &self.hospital_id)?;
        required("doctorId", &self.doctor_id)?;
        Ok(())
    }

    /// Builds the create body with the derived day count
    pub fn to_draft(&self, file_number: String) -> Result<PatientDraft> {
        self.validate()?;
        let date_from = required_some("inputdatefrom", self.date_from)?;
        let date_to = required_some("inputdateto", self.date_to)?;
        let time_from = required_some("inputtimefrom", self.time_from)?;
        let time_to = required_some("inputtimeto", self.time_to)?;

        Ok(PatientDraft {
            name: self.name.trim().to_string(),
            identity: self.identity.trim().to_string(),
            date_from: date_from.format(DATE_FORMAT).to_string(),
            date_to: date_to.format(DATE_FORMAT).to_string(),
            time_from: time_from.format(TIME_FORMAT).to_string(),
            time_to: time_to.format(TIME_FORMAT).to_string(),
            employer: self.employer.trim().to_string(),
            relation: self.relation,
            visit_type: self.visit_type,
            nationality_id: self.nationality_id.clone(),
            doctor_id: self.doctor_id.clone(),
            hospital_id: self.hospital_id.clone(),
            day_count: inclusive_day_count(date_from, date_to).to_string(),
            file_number,
        })
    }

    /// Builds an update body carrying every field and the recomputed day count
    pub fn to_patch(&self) -> Result<PatientPatch> {
        self.validate()?;
        let patch = PatientPatch {
            name: Some(self.name.trim().to_string()),
            identity: Some(self.identity.trim().to_string()),
            time_from: self.time_from.map(|t| t.format(TIME_FORMAT).to_string()),
            time_to: self.time_to.map(|t| t.format(TIME_FORMAT).to_string()),
            employer: Some(self.employer.trim().to_string()),
            relation: Some(self.relation),
            visit_type: Some(self.visit_type),
            nationality_id: Some(self.nationality_id.clone()),
            doctor_id: Some(self.doctor_id.clone()),
            hospital_id: Some(self.hospital_id.clone()),
            ..Default::default()
        };
        match (self.date_from, self.date_to) {
            (Some(from), Some(to)) => Ok(patch.with_dates(from, to)),
            _ => Ok(patch),
        }
    }

    /// Creates the patient with a freshly allocated file number
    pub async fn submit(&self, api: &PatientApi, notifier: &dyn Notifier) -> Result<Patient> {
        let result = self.create(api).await;
        match &result {
            Ok(_) => notifier.notify(messages::added(Patient::LABEL)),
            Err(e) => {
                warn!(error = %e, "patient create failed");
                notifier.notify(messages::add_failed());
            }
        }
        result
    }

    /// Saves the form over an existing patient
    pub async fn submit_update(&self, id: &str, api: &PatientApi, notifier: &dyn Notifier) -> Result<Patient> {
        let result = match self.to_patch() {
            Ok(patch) => api.update(id, &patch).await,
            Err(e) => Err(e),
        };
        match &result {
            Ok(_) => notifier.notify(messages::updated(Patient::LABEL)),
            Err(e) => {
                warn!(patient = id, error = %e, "patient update failed");
                notifier.notify(messages::update_failed());
            }
        }
        result
    }

    async fn create(&self, api: &PatientApi) -> Result<Patient> {
        self.validate()?;
        let file_number = api.allocate_file_number().await?;
        let draft = self.to_draft(file_number)?;
        api.create(&draft).await
    }
}

/// Add form of a doctor
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DoctorForm {
    pub name_ar: String,
    pub name_en: String,
    pub specialization_ar: String,
    pub specialization_en: String,
    pub link_code: String,
}

impl EntityForm for DoctorForm {
    type Target = Doctor;

    fn validate(&self) -> Result<()> {
        required("input_doctor_name_ar", &self.name_ar)?;
        required("input_doctor_name_En", &self.name_en)?;
        required("input_doctor_type_ar", &self.specialization_ar)?;
        required("input_doctor_type_En", &self.specialization_en)?;
        required("input_doctor_num", &self.link_code)
    }

    fn to_draft(&self) -> DoctorDraft {
        DoctorDraft {
            name_ar: self.name_ar.trim().to_string(),
            name_en: self.name_en.trim().to_string(),
            specialization_ar: self.specialization_ar.trim().to_string(),
            specialization_en: self.specialization_en.trim().to_string(),
            link_code: self.link_code.trim().to_string(),
        }
    }
}

/// Add form of a hospital
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HospitalForm {
    pub kind: HospitalType,
    pub name_ar: String,
    pub name_en: String,
    pub license_id: String,
    pub logo: String,
    pub location: String,
    pub doctor_link_code: String,
}

impl EntityForm for HospitalForm {
    type Target = Hospital;

    fn validate(&self) -> Result<()> {
        required("input_central_name_ar", &self.name_ar)?;
        required("input_central_name_en", &self.name_en)?;
        required("input_central_id", &self.license_id)?;
        required("input_central_location", &self.location)?;
        required("input_central_doctor_num", &self.doctor_link_code)?;
        if !self.logo.trim().is_empty() {
            decode_logo(&self.logo).map_err(|e| ApiError::Validation {
                field: "input_central_logo",
                message: format!("not valid base64: {}", e),
            })?;
        }
        Ok(())
    }

    fn to_draft(&self) -> HospitalDraft {
        HospitalDraft {
            kind: self.kind,
            name_ar: self.name_ar.trim().to_string(),
            name_en: self.name_en.trim().to_string(),
            license_id: self.license_id.trim().to_string(),
            logo: self.logo.trim().to_string(),
            location: self.location.trim().to_string(),
            doctor_link_code: self.doctor_link_code.trim().to_string(),
        }
    }
}

/// Add form of a nationality
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NationalityForm {
    pub name_ar: String,
    pub name_en: String,
}

impl EntityForm for NationalityForm {
    type Target = Nationality;

    fn validate(&self) -> Result<()> {
        required("input_national_ar", &self.name_ar)
    }

    fn to_draft(&self) -> NationalityDraft {
        NationalityDraft {
            name_ar: self.name_ar.trim().to_string(),
            name_en: self.name_en.trim().to_string(),
        }
    }
}
