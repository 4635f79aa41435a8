use bitflags::bitflags;

bitflags! {
    /// Sections to include in a report
    pub struct ReportKinds: u8 {
        const SIZE = 0x01;
        const TYPES = 0x02;
        const CONTENT = 0x04;
        const LOOPS = 0x08;
        const SUMMARY = 0x10;
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    /// Declared maximum stack size, in words
    ///
    /// When set, this is used instead of the `max_stack` of the method being analyzed.
    pub max_stack: Option<u16>,

    /// Report sections to produce
    pub reports: ReportKinds,

    /// Text used for any type or value that can't be resolved
    pub placeholder: String,

    /// Give names to the locals that exception handlers store the caught exception into
    ///
    /// Handler code usually starts by storing the exception in a local that has no entry in the
    /// local variable table. With this on, that slot is named `<any exception>` from the store
    /// onwards.
    pub register_handler_locals: bool,
}

impl Settings {
    /// Declared maximum stack size for a method
    pub fn max_stack_for(&self, declared: u16) -> u16 {
        self.max_stack.unwrap_or(declared)
    }
}

impl Default for Settings {
    fn default() -> Settings {
        Settings {
            max_stack: None,
            reports: ReportKinds::all(),
            placeholder: String::from("?"),
            register_handler_locals: true,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert!(settings.reports.contains(ReportKinds::LOOPS | ReportKinds::SUMMARY));
        assert_eq!(settings.max_stack_for(3), 3);

        let settings = Settings {
            max_stack: Some(1),
            ..Settings::default()
        };
        assert_eq!(settings.max_stack_for(3), 1);
    }

    #[test]
    fn reused_settings() {
        let base = Settings {
            placeholder: String::from("<?>"),
            ..Settings::default()
        };
        let summary_only = Settings {
            reports: ReportKinds::SUMMARY,
            ..base.clone()
        };
        assert_eq!(summary_only.placeholder, "<?>");
        assert_eq!(base.reports, ReportKinds::all());
        assert!(format!("{:?}", summary_only).contains("SUMMARY"));
    }
}
