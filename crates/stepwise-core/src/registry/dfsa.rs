//! The DFSA financial-services authorisation application.
//!
//! Sector gating: `activitySelections.A1` is the financial-services sector,
//! `A2`/`A3` the insurance sectors. Most activity-specific steps need the
//! financial-services sector plus a selection for one of their activity
//! codes in `financialServicesMatrix`.

use crate::{models::StepDefinition, rules::Condition};

const MATRIX: &str = "financialServicesMatrix";

fn financial_services() -> Condition {
    Condition::is_true("activitySelections.A1")
}

fn insurance() -> Condition {
    Condition::any(vec![
        Condition::is_true("activitySelections.A2"),
        Condition::is_true("activitySelections.A3"),
    ])
}

/// Financial-services sector with a matrix selection for any of `codes`.
fn fs_matrix(codes: &[&str]) -> Condition {
    Condition::all(vec![financial_services(), Condition::any_non_empty(MATRIX, codes)])
}

/// Hidden for a representative office that selected no activity sector.
fn core_profile() -> Condition {
    Condition::not(Condition::all(vec![
        Condition::is_true("isRepresentativeOffice"),
        Condition::not(Condition::any_flag_set("activitySelections")),
    ]))
}

pub fn stage_names() -> Vec<(u8, String)> {
    vec![
        (1, "General Requirements".to_string()),
        (2, "Activity-Specific Information".to_string()),
        (3, "Core Profile".to_string()),
        (4, "Final Submission".to_string()),
    ]
}

pub fn steps() -> Vec<StepDefinition> {
    vec![
        // Stage 1
        StepDefinition::always(
            "step-1-1",
            1,
            "Introduction & Disclosure",
            "Step1_1_IntroductionDisclosure",
        ),
        StepDefinition::always("step-1-2", 1, "Standing Data", "Step1_2_StandingData"),
        StepDefinition::always(
            "step-1-3",
            1,
            "Ownership Information",
            "Step1_3_OwnershipInformation",
        ),
        StepDefinition::always(
            "step-1-4",
            1,
            "Controllers & Group Structure",
            "Step1_4_ControllersGroupStructure",
        ),
        StepDefinition::always(
            "step-1-5",
            1,
            "Permissions & Financial Services",
            "Step1_5_PermissionsFinancialServices",
        ),
        // Stage 2
        StepDefinition::conditional(
            "step-2-1",
            2,
            "Fund Management",
            "Step2_1_FundManagement",
            fs_matrix(&["A10", "A11", "A13", "FS8"]),
        ),
        StepDefinition::conditional(
            "step-2-2",
            2,
            "Representative Office",
            "Step2_2_RepresentativeOffice",
            Condition::is_true("isRepresentativeOffice"),
        ),
        StepDefinition::conditional(
            "step-2-3",
            2,
            "Islamic Endorsement",
            "Step2_3_IslamicEndorsement",
            Condition::is_true("endorsementSelections.E1_A1"),
        ),
        StepDefinition::conditional(
            "step-2-4",
            2,
            "Advising & Arranging",
            "Step2_4_AdvisingArranging",
            fs_matrix(&["A6", "A7", "A8", "A9", "A14", "FS3", "FS5"]),
        ),
        StepDefinition::conditional(
            "step-2-5",
            2,
            "Insurance Intermediation",
            "Step2_5_InsuranceIntermediation",
            Condition::all(vec![insurance(), Condition::any_non_empty(MATRIX, &["A8", "A9"])]),
        ),
        StepDefinition::conditional(
            "step-2-6",
            2,
            "Asset Management",
            "Step2_6_AssetManagement",
            fs_matrix(&["A5", "A7", "A10", "A11", "A13", "FS4"]),
        ),
        StepDefinition::conditional(
            "step-2-7",
            2,
            "Sales & Trading",
            "Step2_7_SalesTrading",
            fs_matrix(&["A4", "A5", "A14", "FS1", "FS2"]),
        ),
        StepDefinition::conditional(
            "step-2-10",
            2,
            "Money Services",
            "Step2_10_MoneyServices",
            Condition::is_true("activitySelections.A5"),
        ),
        StepDefinition::conditional(
            "step-2-11",
            2,
            "Direct Insurance",
            "Step2_11_DirectInsurance",
            Condition::is_true("activitySelections.A2"),
        ),
        StepDefinition::conditional(
            "step-2-12",
            2,
            "Banking",
            "Step2_12_Banking",
            Condition::any(vec![
                fs_matrix(&["A1", "A2"]),
                Condition::is_true("activitySelections.A6"),
            ]),
        ),
        StepDefinition::conditional(
            "step-2-13",
            2,
            "Retail Endorsement",
            "Step2_13_RetailEndorsement",
            Condition::is_true("endorsementSelections.E2_A1"),
        ),
        StepDefinition::conditional(
            "step-2-14",
            2,
            "Client Assets",
            "Step2_14_ClientAssets",
            Condition::any(vec![
                fs_matrix(&["A4", "A11", "A17", "FS6", "FS7"]),
                Condition::is_true("endorsementSelections.E2_A5"),
            ]),
        ),
        StepDefinition::conditional(
            "step-2-21",
            2,
            "Crowdfunding",
            "Step2_21_Crowdfunding",
            fs_matrix(&["A14", "A18"]),
        ),
        // Stage 3
        StepDefinition::conditional(
            "step-3-1",
            3,
            "Business Plan",
            "Step3_1_BusinessPlan",
            core_profile(),
        ),
        StepDefinition::conditional("step-3-2", 3, "Clients", "Step3_2_Clients", core_profile()),
        StepDefinition::conditional(
            "step-3-4",
            3,
            "Risk Management & Compliance",
            "Step3_4_RiskManagementCompliance",
            core_profile(),
        ),
        StepDefinition::conditional(
            "step-3-5",
            3,
            "Governance",
            "Step3_5_Governance",
            core_profile(),
        ),
        // Stage 4
        StepDefinition::always(
            "step-4-1",
            4,
            "Waivers & Modifications",
            "Step4_1_WaiversModifications",
        ),
        StepDefinition::always("step-4-2", 4, "Application Fees", "Step4_2_ApplicationFees"),
        StepDefinition::always(
            "step-4-3",
            4,
            "Fit & Proper Declarations",
            "Step4_3_FitProperDeclarations",
        ),
        StepDefinition::always("step-4-4", 4, "Review & Submit", "Step4_4_ReviewSubmit"),
    ]
}
