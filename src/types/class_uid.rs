//! OCSF class taxonomy
//!
//! Four-digit class uids are grouped into top-level categories by their
//! leading digit (`uid / 1000`). The grouping is an explicit table rather than string
//! prefix matching so that a new class can never silently land in `Other`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Top-level OCSF category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassCategory {
    SystemActivity,
    Findings,
    IdentityAccessManagement,
    NetworkActivity,
    Discovery,
    ApplicationActivity,
    Remediation,
    UnmannedSystems,
    Other,
}

/// Category table indexed by `uid / 1000`
const CATEGORY_TABLE: [(u32, ClassCategory); 8] = [
    (1, ClassCategory::SystemActivity),
    (2, ClassCategory::Findings),
    (3, ClassCategory::IdentityAccessManagement),
    (4, ClassCategory::NetworkActivity),
    (5, ClassCategory::Discovery),
    (6, ClassCategory::ApplicationActivity),
    (7, ClassCategory::Remediation),
    (8, ClassCategory::UnmannedSystems),
];

impl ClassCategory {
    /// Category for an arbitrary class uid
    ///
    /// Only uids in `1000..=8999` have a category. Everything else is `Other`,
    /// including Base Event (`0`), short uids such as `100` and uids of five
    /// or more digits.
    pub fn for_uid(class_uid: u32) -> Self {
        if !(1000..=9999).contains(&class_uid) {
            return ClassCategory::Other;
        }
        let leading = class_uid / 1000;
        CATEGORY_TABLE
            .iter()
            .find(|(digit, _)| *digit == leading)
            .map(|(_, category)| *category)
            .unwrap_or(ClassCategory::Other)
    }

    /// OCSF `category_uid`, `None` for `Other`
    pub fn uid(&self) -> Option<u32> {
        CATEGORY_TABLE
            .iter()
            .find(|(_, category)| category == self)
            .map(|(digit, _)| *digit)
    }

    /// Plain category name as carried in `category_name`
    pub fn name(&self) -> &'static str {
        match self {
            ClassCategory::SystemActivity => "System Activity",
            ClassCategory::Findings => "Findings",
            ClassCategory::IdentityAccessManagement => "Identity & Access Management",
            ClassCategory::NetworkActivity => "Network Activity",
            ClassCategory::Discovery => "Discovery",
            ClassCategory::ApplicationActivity => "Application Activity",
            ClassCategory::Remediation => "Remediation",
            ClassCategory::UnmannedSystems => "Unmanned Systems",
            ClassCategory::Other => "Other",
        }
    }

    /// Group label, e.g. `Findings [2]`
    pub fn label(&self) -> String {
        match self.uid() {
            Some(uid) => format!("{} [{}]", self.name(), uid),
            None => self.name().to_string(),
        }
    }
}

impl fmt::Display for ClassCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

macro_rules! ocsf_classes {
    ($($variant:ident = $uid:literal => $name:literal,)+) => {
        /// Known OCSF event classes
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum OcsfClass {
            $($variant,)+
        }

        impl OcsfClass {
            pub const ALL: &'static [OcsfClass] = &[$(OcsfClass::$variant,)+];

            pub fn uid(&self) -> u32 {
                match self {
                    $(OcsfClass::$variant => $uid,)+
                }
            }

            pub fn name(&self) -> &'static str {
                match self {
                    $(OcsfClass::$variant => $name,)+
                }
            }

            pub fn from_uid(uid: u32) -> Option<Self> {
                match uid {
                    $($uid => Some(OcsfClass::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

ocsf_classes! {
    FileSystemActivity = 1001 => "File System Activity",
    KernelExtensionActivity = 1002 => "Kernel Extension Activity",
    KernelActivity = 1003 => "Kernel Activity",
    MemoryActivity = 1004 => "Memory Activity",
    ModuleActivity = 1005 => "Module Activity",
    ScheduledJobActivity = 1006 => "Scheduled Job Activity",
    ProcessActivity = 1007 => "Process Activity",
    EventLogActivity = 1008 => "Event Log Activity",
    SecurityFinding = 2001 => "Security Finding",
    VulnerabilityFinding = 2002 => "Vulnerability Finding",
    ComplianceFinding = 2003 => "Compliance Finding",
    DetectionFinding = 2004 => "Detection Finding",
    IncidentFinding = 2005 => "Incident Finding",
    DataSecurityFinding = 2006 => "Data Security Finding",
    AccountChange = 3001 => "Account Change",
    Authentication = 3002 => "Authentication",
    AuthorizeSession = 3003 => "Authorize Session",
    EntityManagement = 3004 => "Entity Management",
    UserAccessManagement = 3005 => "User Access Management",
    GroupManagement = 3006 => "Group Management",
    NetworkActivity = 4001 => "Network Activity",
    HttpActivity = 4002 => "HTTP Activity",
    DnsActivity = 4003 => "DNS Activity",
    DhcpActivity = 4004 => "DHCP Activity",
    RdpActivity = 4005 => "RDP Activity",
    SmbActivity = 4006 => "SMB Activity",
    SshActivity = 4007 => "SSH Activity",
    FtpActivity = 4008 => "FTP Activity",
    EmailActivity = 4009 => "Email Activity",
    NetworkFileActivity = 4010 => "Network File Activity",
    EmailFileActivity = 4011 => "Email File Activity",
    EmailUrlActivity = 4012 => "Email URL Activity",
    NtpActivity = 4013 => "NTP Activity",
    TunnelActivity = 4014 => "Tunnel Activity",
    DeviceInventoryInfo = 5001 => "Device Inventory Info",
    DeviceConfigState = 5002 => "Device Config State",
    UserInventoryInfo = 5003 => "User Inventory Info",
    OperatingSystemPatchState = 5004 => "Operating System Patch State",
    DeviceConfigStateChange = 5019 => "Device Config State Change",
    WebResourcesActivity = 6001 => "Web Resources Activity",
    ApplicationLifecycle = 6002 => "Application Lifecycle",
    ApiActivity = 6003 => "API Activity",
    WebResourceAccessActivity = 6004 => "Web Resource Access Activity",
    DatastoreActivity = 6005 => "Datastore Activity",
    FileHostingActivity = 6006 => "File Hosting Activity",
    ScanActivity = 6007 => "Scan Activity",
    RemediationActivity = 7001 => "Remediation Activity",
    FileRemediationActivity = 7002 => "File Remediation Activity",
    ProcessRemediationActivity = 7003 => "Process Remediation Activity",
    NetworkRemediationActivity = 7004 => "Network Remediation Activity",
    DroneFlightsActivity = 8001 => "Drone Flights Activity",
    AirborneBroadcastActivity = 8002 => "Airborne Broadcast Activity",
}

impl OcsfClass {
    pub fn category(&self) -> ClassCategory {
        ClassCategory::for_uid(self.uid())
    }

    /// Selection label, e.g. `File System Activity (1001)`
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.name(), self.uid())
    }
}

impl fmt::Display for OcsfClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One selectable class inside a group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassEntry {
    pub name: String,
    pub uid: u32,
}

/// Classes sharing a top-level category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassGroup {
    pub category: String,
    pub classes: Vec<ClassEntry>,
}

/// All known classes grouped by category
///
/// Groups are ordered by category number (`Other` last), classes by name.
pub fn class_groups() -> Vec<ClassGroup> {
    let mut grouped: Vec<(ClassCategory, Vec<ClassEntry>)> = Vec::new();

    for class in OcsfClass::ALL {
        let entry = ClassEntry {
            name: class.display_name(),
            uid: class.uid(),
        };
        match grouped.iter_mut().find(|(c, _)| *c == class.category()) {
            Some((_, entries)) => entries.push(entry),
            None => grouped.push((class.category(), vec![entry])),
        }
    }

    grouped.sort_by_key(|(category, _)| category.uid().unwrap_or(99));

    grouped
        .into_iter()
        .map(|(category, mut classes)| {
            classes.sort_by(|a, b| a.name.cmp(&b.name));
            ClassGroup {
                category: category.label(),
                classes,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_class_has_a_named_category() {
        for class in OcsfClass::ALL {
            let category = class.category();
            assert_ne!(category, ClassCategory::Other, "{:?} fell into Other", class);

            let leading = class.uid().to_string().chars().next().unwrap();
            assert_eq!(category.uid().unwrap().to_string(), leading.to_string());
        }
    }

    #[test]
    fn test_from_uid_round_trips_every_class() {
        for class in OcsfClass::ALL {
            assert_eq!(OcsfClass::from_uid(class.uid()), Some(*class));
        }
        assert_eq!(OcsfClass::from_uid(9999), None);
    }

    #[test]
    fn test_unknown_uids_map_to_other() {
        assert_eq!(ClassCategory::for_uid(0), ClassCategory::Other);
        assert_eq!(ClassCategory::for_uid(9001), ClassCategory::Other);
        assert_eq!(ClassCategory::for_uid(42), ClassCategory::Other);
        assert_eq!(ClassCategory::Other.label(), "Other");
    }

    #[test]
    fn test_category_range_is_four_digit_uids() {
        assert_eq!(ClassCategory::for_uid(1000), ClassCategory::SystemActivity);
        assert_eq!(ClassCategory::for_uid(8999), ClassCategory::UnmannedSystems);
        // Base Event and out-of-range uids never borrow a leading digit
        assert_eq!(ClassCategory::for_uid(100), ClassCategory::Other);
        assert_eq!(ClassCategory::for_uid(999), ClassCategory::Other);
        assert_eq!(ClassCategory::for_uid(10_001), ClassCategory::Other);
        assert_eq!(ClassCategory::for_uid(20_000), ClassCategory::Other);
    }

    #[test]
    fn test_class_groups_ordering() {
        let groups = class_groups();
        let labels: Vec<&str> = groups.iter().map(|g| g.category.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "System Activity [1]",
                "Findings [2]",
                "Identity & Access Management [3]",
                "Network Activity [4]",
                "Discovery [5]",
                "Application Activity [6]",
                "Remediation [7]",
                "Unmanned Systems [8]",
            ]
        );

        let system = &groups[0].classes;
        assert_eq!(system[0].name, "Event Log Activity (1008)");
        assert!(system.windows(2).all(|w| w[0].name <= w[1].name));

        let total: usize = groups.iter().map(|g| g.classes.len()).sum();
        assert_eq!(total, OcsfClass::ALL.len());
    }
}
