//! Portuguese display labels and badge colour classes for the enumerations.

use clinic_wire::{
    AppointmentStatus, ClosureType, EmployeeRole, EmployeeStatus, ServiceCategory, Specialty,
    Weekday,
};

pub trait DisplayLabel {
    fn label(&self) -> &'static str;

    /// Badge colour class; neutral grey unless a type says otherwise.
    fn color_class(&self) -> &'static str {
        "bg-gray-100 text-gray-800"
    }
}

impl DisplayLabel for AppointmentStatus {
    fn label(&self) -> &'static str {
        match self {
            AppointmentStatus::Agendada => "Agendada",
            AppointmentStatus::Confirmada => "Confirmada",
            AppointmentStatus::Reagendada => "Reagendada",
            AppointmentStatus::Cancelada => "Cancelada",
            AppointmentStatus::Realizada => "Realizada",
            AppointmentStatus::NaoCompareceu => "Não compareceu",
        }
    }

    fn color_class(&self) -> &'static str {
        match self {
            AppointmentStatus::Agendada => "bg-blue-100 text-blue-800",
            AppointmentStatus::Confirmada => "bg-green-100 text-green-800",
            AppointmentStatus::Reagendada => "bg-yellow-100 text-yellow-800",
            AppointmentStatus::Cancelada => "bg-red-100 text-red-800",
            AppointmentStatus::Realizada => "bg-emerald-100 text-emerald-800",
            AppointmentStatus::NaoCompareceu => "bg-orange-100 text-orange-800",
        }
    }
}

impl DisplayLabel for ServiceCategory {
    fn label(&self) -> &'static str {
        match self {
            ServiceCategory::Preventivo => "Preventivo",
            ServiceCategory::Restaurador => "Restaurador",
            ServiceCategory::Endodontia => "Endodontia",
            ServiceCategory::Periodontia => "Periodontia",
            ServiceCategory::Ortodontia => "Ortodontia",
            ServiceCategory::Cirurgia => "Cirurgia",
            ServiceCategory::Protese => "Prótese",
            ServiceCategory::Estetica => "Estética",
            ServiceCategory::Implante => "Implante",
            ServiceCategory::Diagnostico => "Diagnóstico",
        }
    }

    fn color_class(&self) -> &'static str {
        match self {
            ServiceCategory::Preventivo => "bg-green-100 text-green-800",
            ServiceCategory::Restaurador => "bg-blue-100 text-blue-800",
            ServiceCategory::Endodontia => "bg-purple-100 text-purple-800",
            ServiceCategory::Periodontia => "bg-pink-100 text-pink-800",
            ServiceCategory::Ortodontia => "bg-indigo-100 text-indigo-800",
            ServiceCategory::Cirurgia => "bg-red-100 text-red-800",
            ServiceCategory::Protese => "bg-yellow-100 text-yellow-800",
            ServiceCategory::Estetica => "bg-rose-100 text-rose-800",
            ServiceCategory::Implante => "bg-cyan-100 text-cyan-800",
            ServiceCategory::Diagnostico => "bg-gray-100 text-gray-800",
        }
    }
}

impl DisplayLabel for EmployeeRole {
    fn label(&self) -> &'static str {
        match self {
            EmployeeRole::Dentista => "Dentista",
            EmployeeRole::Auxiliar => "Auxiliar de Saúde Bucal",
            EmployeeRole::Higienista => "Técnico em Saúde Bucal",
            EmployeeRole::Recepcionista => "Recepcionista",
            EmployeeRole::Gerente => "Gerente",
            EmployeeRole::Administrativo => "Administrativo",
        }
    }

    fn color_class(&self) -> &'static str {
        if self.is_clinical() {
            "bg-blue-100 text-blue-800"
        } else {
            "bg-gray-100 text-gray-800"
        }
    }
}

impl DisplayLabel for Specialty {
    fn label(&self) -> &'static str {
        match self {
            Specialty::ClinicaGeral => "Clínica Geral",
            Specialty::Ortodontia => "Ortodontia",
            Specialty::Endodontia => "Endodontia",
            Specialty::Periodontia => "Periodontia",
            Specialty::Implantodontia => "Implantodontia",
            Specialty::Odontopediatria => "Odontopediatria",
            Specialty::Protese => "Prótese",
            Specialty::Cirurgia => "Cirurgia Bucomaxilofacial",
            Specialty::Estetica => "Estética",
        }
    }
}

impl DisplayLabel for EmployeeStatus {
    fn label(&self) -> &'static str {
        match self {
            EmployeeStatus::Ativo => "Ativo",
            EmployeeStatus::Inativo => "Inativo",
        }
    }

    fn color_class(&self) -> &'static str {
        match self {
            EmployeeStatus::Ativo => "bg-green-100 text-green-800",
            EmployeeStatus::Inativo => "bg-red-100 text-red-800",
        }
    }
}

impl DisplayLabel for ClosureType {
    fn label(&self) -> &'static str {
        match self {
            ClosureType::Feriado => "Feriado",
            ClosureType::Ferias => "Férias",
            ClosureType::Manutencao => "Manutenção",
            ClosureType::Outro => "Outro",
        }
    }

    fn color_class(&self) -> &'static str {
        match self {
            ClosureType::Feriado => "bg-red-100 text-red-800",
            ClosureType::Ferias => "bg-blue-100 text-blue-800",
            ClosureType::Manutencao => "bg-yellow-100 text-yellow-800",
            ClosureType::Outro => "bg-gray-100 text-gray-800",
        }
    }
}

impl DisplayLabel for Weekday {
    fn label(&self) -> &'static str {
        match self {
            Weekday::Segunda => "Segunda-feira",
            Weekday::Terca => "Terça-feira",
            Weekday::Quarta => "Quarta-feira",
            Weekday::Quinta => "Quinta-feira",
            Weekday::Sexta => "Sexta-feira",
            Weekday::Sabado => "Sábado",
            Weekday::Domingo => "Domingo",
        }
    }
}
