//! Constants used throughout the clinic core crate.
//!
//! Notification texts are shown to clinic staff as-is, so they stay in Portuguese.

/// Default number of rows per page for list endpoints.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Largest page size a caller may configure.
pub const MAX_PAGE_SIZE: usize = 500;

/// Path prefix of the PostgREST data API on the hosted backend.
pub const REST_PATH: &str = "rest/v1";

/// Path prefix of the auth API on the hosted backend.
pub const AUTH_PATH: &str = "auth/v1";

/// Capacity of the in-process event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Fixed user-facing messages published when an operation fails or succeeds.
pub mod messages {
    pub const LOAD_PATIENTS: &str = "Erro ao carregar pacientes";
    pub const LOAD_PATIENT: &str = "Erro ao carregar paciente";
    pub const CREATE_PATIENT: &str = "Erro ao cadastrar paciente";
    pub const UPDATE_PATIENT: &str = "Erro ao atualizar paciente";
    pub const DELETE_PATIENT: &str = "Erro ao excluir paciente";
    pub const PATIENT_CREATED: &str = "Paciente cadastrado com sucesso";
    pub const PATIENT_UPDATED: &str = "Paciente atualizado com sucesso";
    pub const PATIENT_DELETED: &str = "Paciente excluído com sucesso";

    pub const LOAD_EMPLOYEES: &str = "Erro ao carregar funcionários";
    pub const LOAD_EMPLOYEE: &str = "Erro ao carregar funcionário";
    pub const CREATE_EMPLOYEE: &str = "Erro ao cadastrar funcionário";
    pub const UPDATE_EMPLOYEE: &str = "Erro ao atualizar funcionário";
    pub const DELETE_EMPLOYEE: &str = "Erro ao excluir funcionário";
    pub const EMPLOYEE_CREATED: &str = "Funcionário cadastrado com sucesso";
    pub const EMPLOYEE_UPDATED: &str = "Funcionário atualizado com sucesso";
    pub const EMPLOYEE_DELETED: &str = "Funcionário excluído com sucesso";

    pub const LOAD_SERVICES: &str = "Erro ao carregar serviços";
    pub const LOAD_SERVICE: &str = "Erro ao carregar serviço";
    pub const CREATE_SERVICE: &str = "Erro ao cadastrar serviço";
    pub const UPDATE_SERVICE: &str = "Erro ao atualizar serviço";
    pub const DELETE_SERVICE: &str = "Erro ao excluir serviço";
    pub const SERVICE_CREATED: &str = "Serviço cadastrado com sucesso";
    pub const SERVICE_UPDATED: &str = "Serviço atualizado com sucesso";
    pub const SERVICE_DELETED: &str = "Serviço excluído com sucesso";

    pub const LOAD_APPOINTMENTS: &str = "Erro ao carregar agendamentos";
    pub const LOAD_APPOINTMENT: &str = "Erro ao carregar agendamento";
    pub const CREATE_APPOINTMENT: &str = "Erro ao criar agendamento";
    pub const UPDATE_APPOINTMENT: &str = "Erro ao atualizar agendamento";
    pub const UPDATE_APPOINTMENT_STATUS: &str = "Erro ao atualizar status do agendamento";
    pub const DELETE_APPOINTMENT: &str = "Erro ao excluir agendamento";
    pub const APPOINTMENT_CREATED: &str = "Agendamento criado com sucesso";
    pub const APPOINTMENT_UPDATED: &str = "Agendamento atualizado com sucesso";
    pub const APPOINTMENT_STATUS_UPDATED: &str = "Status do agendamento atualizado";
    pub const APPOINTMENT_DELETED: &str = "Agendamento excluído com sucesso";

    pub const LOAD_CLOSURES: &str = "Erro ao carregar fechamentos";
    pub const CREATE_CLOSURE: &str = "Erro ao cadastrar fechamento";
    pub const UPDATE_CLOSURE: &str = "Erro ao atualizar fechamento";
    pub const DELETE_CLOSURE: &str = "Erro ao excluir fechamento";

    pub const LOAD_CLINIC_HOURS: &str = "Erro ao carregar horários da clínica";
    pub const SAVE_CLINIC_HOURS: &str = "Erro ao salvar horários da clínica";
    pub const LOAD_CLINIC_ADDRESS: &str = "Erro ao carregar endereço da clínica";
    pub const SAVE_CLINIC_ADDRESS: &str = "Erro ao salvar endereço da clínica";

    pub const LOAD_CONVENIOS: &str = "Erro ao carregar convênios";
    pub const CREATE_CONVENIO: &str = "Erro ao cadastrar convênio";
    pub const UPDATE_CONVENIO: &str = "Erro ao atualizar convênio";
    pub const DELETE_CONVENIO: &str = "Erro ao excluir convênio";

    pub const LOAD_REPORTS: &str = "Erro ao carregar relatórios";

    pub const SIGN_IN: &str = "Erro ao fazer login";
    pub const SIGN_OUT: &str = "Erro ao sair";
}
