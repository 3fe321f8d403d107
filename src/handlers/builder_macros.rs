//! Macros shared by the publisher builders.

/// Validate that a value is greater than zero, returning an error otherwise.
macro_rules! ensure_positive {
    ($value:expr, $field:expr) => {{
        if $value == 0 {
            Err($crate::handlers::HandlerBuildError::InvalidConfig(format!(
                "{} must be greater than zero",
                $field
            )))
        } else {
            Ok($value)
        }
    }};
}

pub(crate) use ensure_positive;

/// Generate a consuming setter storing `Some(value)` in an optional field.
macro_rules! option_setter {
    ($(#[$meta:meta])* $fn_name:ident, $($field:ident).+, $ty:ty) => {
        $(#[$meta])*
        pub fn $fn_name(mut self, value: $ty) -> Self {
            self.$($field).+ = Some(value);
            self
        }
    };
}

pub(crate) use option_setter;

/// Generate the setters every publisher builder exposes through its
/// `common` field.
macro_rules! common_setters {
    () => {
        $crate::handlers::builder_macros::option_setter!(
            #[doc = "Ignore records less severe than `level`."]
            with_level,
            common.level,
            $crate::level::Level
        );
        $crate::handlers::builder_macros::option_setter!(
            #[doc = "Set the connect timeout in milliseconds."]
            with_connect_timeout_ms,
            common.connect_timeout_ms,
            u64
        );
        $crate::handlers::builder_macros::option_setter!(
            #[doc = "Set the write timeout in milliseconds."]
            with_write_timeout_ms,
            common.write_timeout_ms,
            u64
        );

        /// Encode records with `encoder` instead of the builder's default.
        pub fn with_encoder(mut self, encoder: $crate::encoder::SharedEncoder) -> Self {
            self.common.encoder = Some(encoder);
            self
        }

        /// Select one of the bundled encoders by kind.
        pub fn with_encoder_kind(self, kind: $crate::encoder::EncoderKind) -> Self {
            self.with_encoder(kind.shared())
        }

        /// Send delivery failures to `reporter` instead of the `log` facade.
        pub fn with_reporter(
            mut self,
            reporter: std::sync::Arc<dyn $crate::report::ErrorReporter>,
        ) -> Self {
            self.common.reporter = Some(reporter);
            self
        }
    };
}

pub(crate) use common_setters;
