//! Study layout configuration.
//!
//! Which folders hold which modality, and which filename prefixes identify
//! recognized source extracts, are configuration data rather than code: the
//! defaults below describe the reference study layout and can be overridden
//! wholesale from a JSON file.

use std::fmt;
use std::path::Path;

use cohort_model::KeySpec;

use crate::error::{CoreError, Result};

/// A data modality of the study.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    SubjectCharacteristics,
    MedicalHistory,
    MotorAssessments,
    NonMotorAssessments,
    Biospecimen,
}

impl Modality {
    pub const ALL: [Modality; 5] = [
        Modality::SubjectCharacteristics,
        Modality::MedicalHistory,
        Modality::MotorAssessments,
        Modality::NonMotorAssessments,
        Modality::Biospecimen,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Modality::SubjectCharacteristics => "subject_characteristics",
            Modality::MedicalHistory => "medical_history",
            Modality::MotorAssessments => "motor_assessments",
            Modality::NonMotorAssessments => "non_motor_assessments",
            Modality::Biospecimen => "biospecimen",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Modality::ALL
            .into_iter()
            .find(|m| m.name() == raw.trim().to_lowercase())
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Folder and recognized filename prefixes for one modality.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ModalityConfig {
    pub folder: String,
    pub prefixes: Vec<String>,
}

/// Long-to-wide pivot of assay results.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PivotConfig {
    /// Column naming the test (becomes one output column per value).
    pub test_name: String,
    /// Column holding the test result.
    pub test_value: String,
    /// Extra columns carried alongside the keys (kept when present).
    #[serde(default)]
    pub carry: Vec<String>,
}

/// One independent biospecimen source.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SourceConfig {
    /// Source identifier, used for include/exclude filtering and logging.
    pub name: String,
    /// Filename prefix identifying the source's extracts.
    pub prefix: String,
    /// Prefix applied to every non-key column before the cross-source merge,
    /// so unrelated same-named columns never collide.
    pub column_prefix: String,
    /// Pivot configuration for long-format assay extracts.
    #[serde(default)]
    pub pivot: Option<PivotConfig>,
}

/// Biospecimen folder and its sources.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BiospecimenConfig {
    pub folder: String,
    pub sources: Vec<SourceConfig>,
}

/// Full study layout: key columns plus per-modality folders and prefixes.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StudyConfig {
    #[serde(default)]
    pub keys: KeySpec,
    pub subject_characteristics: ModalityConfig,
    pub medical_history: ModalityConfig,
    pub motor_assessments: ModalityConfig,
    pub non_motor_assessments: ModalityConfig,
    pub biospecimen: BiospecimenConfig,
}

impl StudyConfig {
    pub fn modality(&self, modality: Modality) -> Option<&ModalityConfig> {
        match modality {
            Modality::SubjectCharacteristics => Some(&self.subject_characteristics),
            Modality::MedicalHistory => Some(&self.medical_history),
            Modality::MotorAssessments => Some(&self.motor_assessments),
            Modality::NonMotorAssessments => Some(&self.non_motor_assessments),
            Modality::Biospecimen => None,
        }
    }
}

fn prefixes(list: &[&str]) -> Vec<String> {
    list.iter().map(|p| p.to_string()).collect()
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            keys: KeySpec::default(),
            subject_characteristics: ModalityConfig {
                folder: "_Subject_Characteristics".to_string(),
                prefixes: prefixes(&[
                    "Age_at_visit",
                    "Demographics",
                    "Family_History",
                    "iu_genetic_consensus",
                    "Participant_Status",
                    "PPMI_PD_Variants",
                    "PPMI_Project_9001",
                    "Socio-Economics",
                    "Subject_Cohort_History",
                ]),
            },
            // Many medical history extracts cannot be merged across tables:
            // data is recorded multiple times per visit (adverse event logs)
            // or on a timeline that does not correspond to visits at all
            // (concomitant medication date ranges). These tables stay
            // separate.
            medical_history: ModalityConfig {
                folder: "Medical_History".to_string(),
                prefixes: prefixes(&[
                    "Adverse_Event",
                    "Clinical_Diagnosis",
                    "Clinical_Global_Impression",
                    "Concomitant_Medication",
                    "Determination_of_Freezing_and_Falls",
                    "Features_of_Parkinsonism",
                    "Features_of_REM_Behavior_Disorder",
                    "General_Physical_Exam",
                    "Initiation_of_Dopaminergic_Therapy",
                    "LEDD_Concomitant_Medication",
                    "Medical_Conditions",
                    "Neurological_Exam",
                    "Other_Clinical_Features",
                    "Participant_Global_Impression",
                    "PD_Diagnosis_History",
                    "Pregnancy_Test",
                    "Primary_Clincial_Diagnosis",
                    "Procedure_for_PD_Log",
                    "Report_of_Pregnancy",
                    "Vital_Signs",
                ]),
            },
            motor_assessments: ModalityConfig {
                folder: "Motor___MDS-UPDRS".to_string(),
                prefixes: prefixes(&[
                    "Gait_Data___Arm_swing",
                    "Gait_Substudy_Gait_Mobility_Assessment",
                    "MDS-UPDRS_Part_I",
                    "Modified_Schwab",
                    "Neuro_QoL",
                    "Participant_Motor_Function",
                ]),
            },
            non_motor_assessments: ModalityConfig {
                folder: "Non-motor_Assessments".to_string(),
                prefixes: prefixes(&[
                    "Benton_Judgement",
                    "Clock_Drawing",
                    "Cognitive_Categorization",
                    "Cognitive_Change",
                    "Epworth_Sleepiness_Scale",
                    "Geriatric_Depression_Scale",
                    "Hopkins_Verbal_Learning_Test",
                    "Letter_-_Number_Sequencing",
                    "Lexical_Fluency",
                    "Modified_Boston_Naming_Test",
                    "Modified_Semantic_Fluency",
                    "Montreal_Cognitive_Assessment",
                    "Neuro_QoL__Cognition",
                    "Neuro_QoL__Communication",
                    "QUIP-Current-Short",
                    "REM_Sleep_Behavior_Disorder_Questionnaire",
                    "SCOPA-AUT",
                    "State-Trait_Anxiety_Inventory",
                    "Symbol_Digit_Modalities",
                    "Trail_Making",
                    "University_of_Pennsylvania_Smell_Identification",
                ]),
            },
            biospecimen: BiospecimenConfig {
                folder: "Biospecimen".to_string(),
                sources: vec![
                    SourceConfig {
                        name: "current_biospecimen".to_string(),
                        prefix: "Current_Biospecimen_Analysis_Results".to_string(),
                        column_prefix: "BIO_".to_string(),
                        pivot: Some(PivotConfig {
                            test_name: "TESTNAME".to_string(),
                            test_value: "TESTVALUE".to_string(),
                            carry: vec!["SEX".to_string(), "COHORT".to_string()],
                        }),
                    },
                    SourceConfig {
                        name: "csf_pqtl".to_string(),
                        prefix: "Project_151_pQTL_in_CSF".to_string(),
                        column_prefix: "151_".to_string(),
                        pivot: Some(PivotConfig {
                            test_name: "TESTNAME".to_string(),
                            test_value: "TESTVALUE".to_string(),
                            carry: Vec::new(),
                        }),
                    },
                    SourceConfig {
                        name: "metabolomic_lrrk2".to_string(),
                        prefix: "Metabolomic_Analysis_of_LRRK2".to_string(),
                        column_prefix: "LRRK2_".to_string(),
                        pivot: Some(PivotConfig {
                            test_name: "TESTNAME".to_string(),
                            test_value: "TESTVALUE".to_string(),
                            carry: Vec::new(),
                        }),
                    },
                    SourceConfig {
                        name: "urine_proteomics".to_string(),
                        prefix: "Targeted___untargeted_MS-based_proteomics_of_urine_in_PD"
                            .to_string(),
                        column_prefix: "URINE_".to_string(),
                        pivot: Some(PivotConfig {
                            test_name: "TESTNAME".to_string(),
                            test_value: "TESTVALUE".to_string(),
                            carry: Vec::new(),
                        }),
                    },
                ],
            },
        }
    }
}

/// Load a study configuration from a JSON file.
pub fn load_config(path: &Path) -> Result<StudyConfig> {
    let raw = std::fs::read_to_string(path).map_err(|e| CoreError::ConfigRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&raw).map_err(|e| CoreError::ConfigParse {
        path: path.to_path_buf(),
        source: e,
    })
}
